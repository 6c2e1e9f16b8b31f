//! Canned service documents.
//!
//! Each module holds the documents of one fictional service plus a
//! [`MockHttp`] wired with the URLs a client issues against it.

use crate::http::MockHttp;

/// WFS 2.0.0 with stored queries, `CountDefault=100` and no result paging.
pub mod wfs {
    use super::MockHttp;

    pub const BASE_URL: &str = "https://example.org/wfs";

    pub const CAPABILITIES_URL: &str =
        "https://example.org/wfs?service=WFS&version=2.0.0&request=GetCapabilities";

    pub const LIST_STORED_QUERIES_URL: &str =
        "https://example.org/wfs?service=WFS&version=2.0.0&request=ListStoredQueries";

    pub const DESCRIBE_GET_PLACE_BY_NAME_URL: &str = "https://example.org/wfs?service=WFS&version=2.0.0&request=DescribeStoredQueries&storedQuery_ID=GetPlaceByName";

    pub const DESCRIBE_GET_FEATURE_BY_ID_URL: &str = "https://example.org/wfs?service=WFS&version=2.0.0&request=DescribeStoredQueries&storedQuery_ID=urn%3Aogc%3Adef%3Aquery%3AOGC-WFS%3A%3AGetFeatureById";

    pub const CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:WFS_Capabilities xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:ows="http://www.opengis.net/ows/1.1" xmlns:fes="http://www.opengis.net/fes/2.0" xmlns:gn="http://inspire.ec.europa.eu/schemas/gn/4.0" version="2.0.0">
  <ows:ServiceIdentification>
    <ows:Title>Nomenclator Geografico Basico</ows:Title>
    <ows:Abstract>Geographical names download service</ows:Abstract>
    <ows:ServiceType>WFS</ows:ServiceType>
    <ows:ServiceTypeVersion>2.0.0</ows:ServiceTypeVersion>
  </ows:ServiceIdentification>
  <ows:OperationsMetadata>
    <ows:Operation name="GetCapabilities">
      <ows:Parameter name="AcceptVersions">
        <ows:AllowedValues><ows:Value>2.0.0</ows:Value></ows:AllowedValues>
      </ows:Parameter>
    </ows:Operation>
    <ows:Operation name="DescribeFeatureType"/>
    <ows:Operation name="GetFeature">
      <ows:Parameter name="outputFormat">
        <ows:AllowedValues><ows:Value>application/gml+xml; version=3.2</ows:Value></ows:AllowedValues>
      </ows:Parameter>
    </ows:Operation>
    <ows:Operation name="ListStoredQueries"/>
    <ows:Operation name="DescribeStoredQueries"/>
    <ows:Constraint name="ImplementsResultPaging"><ows:NoValues/><ows:DefaultValue>FALSE</ows:DefaultValue></ows:Constraint>
    <ows:Constraint name="CountDefault"><ows:NoValues/><ows:DefaultValue>100</ows:DefaultValue></ows:Constraint>
  </ows:OperationsMetadata>
  <wfs:FeatureTypeList>
    <wfs:FeatureType>
      <wfs:Name>gn:NamedPlace</wfs:Name>
      <wfs:Title>Named places</wfs:Title>
      <wfs:DefaultCRS>urn:ogc:def:crs:EPSG::4258</wfs:DefaultCRS>
      <wfs:OtherCRS>urn:ogc:def:crs:EPSG::25830</wfs:OtherCRS>
      <wfs:OutputFormats><wfs:Format>application/gml+xml; version=3.2</wfs:Format></wfs:OutputFormats>
    </wfs:FeatureType>
  </wfs:FeatureTypeList>
</wfs:WFS_Capabilities>"#;

    pub const LIST_STORED_QUERIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:ListStoredQueriesResponse xmlns:wfs="http://www.opengis.net/wfs/2.0">
  <wfs:StoredQuery id="urn:ogc:def:query:OGC-WFS::GetFeatureById">
    <wfs:Title>GetFeatureById</wfs:Title>
  </wfs:StoredQuery>
  <wfs:StoredQuery id="GetPlaceByName">
    <wfs:Title>GetPlaceByName</wfs:Title>
  </wfs:StoredQuery>
</wfs:ListStoredQueriesResponse>"#;

    pub const DESCRIBE_GET_PLACE_BY_NAME: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:DescribeStoredQueriesResponse xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <wfs:StoredQueryDescription id="GetPlaceByName">
    <wfs:Title>GetPlaceByName</wfs:Title>
    <wfs:Abstract xml:lang="es">Devuelve las entidades cuyo nombre coincide</wfs:Abstract>
    <wfs:Abstract xml:lang="en">Returns the places whose name matches</wfs:Abstract>
    <wfs:Parameter name="name" type="xsd:string">
      <wfs:Abstract>Geographical name</wfs:Abstract>
    </wfs:Parameter>
  </wfs:StoredQueryDescription>
</wfs:DescribeStoredQueriesResponse>"#;

    pub const DESCRIBE_GET_FEATURE_BY_ID: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:DescribeStoredQueriesResponse xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <wfs:StoredQueryDescription id="urn:ogc:def:query:OGC-WFS::GetFeatureById">
    <wfs:Title>GetFeatureById</wfs:Title>
    <wfs:Parameter name="ID" type="xsd:string"/>
  </wfs:StoredQueryDescription>
</wfs:DescribeStoredQueriesResponse>"#;

    /// Capabilities, listing and both descriptions.
    pub fn mock() -> MockHttp {
        MockHttp::new()
            .route(CAPABILITIES_URL, CAPABILITIES)
            .route(LIST_STORED_QUERIES_URL, LIST_STORED_QUERIES)
            .route(DESCRIBE_GET_PLACE_BY_NAME_URL, DESCRIBE_GET_PLACE_BY_NAME)
            .route(DESCRIBE_GET_FEATURE_BY_ID_URL, DESCRIBE_GET_FEATURE_BY_ID)
    }
}

/// WCS 2.0.1 offering the single coverage `Elevacion4258_5`.
pub mod wcs {
    use super::MockHttp;

    pub const BASE_URL: &str = "https://example.org/wcs";

    pub const CAPABILITIES_URL: &str =
        "https://example.org/wcs?service=WCS&version=2.0.1&request=GetCapabilities";

    pub const DESCRIBE_URL: &str = "https://example.org/wcs?service=WCS&version=2.0.1&request=DescribeCoverage&coverageID=Elevacion4258_5";

    pub const CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wcs:Capabilities xmlns:wcs="http://www.opengis.net/wcs/2.0" xmlns:ows="http://www.opengis.net/ows/2.0" xmlns:crs="http://www.opengis.net/wcs/crs/1.0" version="2.0.1">
  <ows:ServiceIdentification>
    <ows:Title>Modelos Digitales del Terreno</ows:Title>
    <ows:Abstract>Elevation coverages</ows:Abstract>
    <ows:ServiceType>OGC WCS</ows:ServiceType>
    <ows:ServiceTypeVersion>2.0.1</ows:ServiceTypeVersion>
  </ows:ServiceIdentification>
  <ows:OperationsMetadata>
    <ows:Operation name="GetCapabilities"/>
    <ows:Operation name="DescribeCoverage"/>
    <ows:Operation name="GetCoverage"/>
  </ows:OperationsMetadata>
  <wcs:ServiceMetadata>
    <wcs:formatSupported>image/tiff</wcs:formatSupported>
    <wcs:formatSupported>application/x-netcdf</wcs:formatSupported>
    <wcs:Extension>
      <crs:CrsMetadata>
        <crs:crsSupported>http://www.opengis.net/def/crs/EPSG/0/4258</crs:crsSupported>
        <crs:crsSupported>http://www.opengis.net/def/crs/EPSG/0/25830</crs:crsSupported>
      </crs:CrsMetadata>
    </wcs:Extension>
  </wcs:ServiceMetadata>
  <wcs:Contents>
    <wcs:CoverageSummary>
      <wcs:CoverageId>Elevacion4258_5</wcs:CoverageId>
      <wcs:CoverageSubtype>RectifiedGridCoverage</wcs:CoverageSubtype>
      <ows:WGS84BoundingBox>
        <ows:LowerCorner>-18.5 27.5</ows:LowerCorner>
        <ows:UpperCorner>4.5 44.0</ows:UpperCorner>
      </ows:WGS84BoundingBox>
    </wcs:CoverageSummary>
  </wcs:Contents>
</wcs:Capabilities>"#;

    pub const DESCRIBE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wcs:CoverageDescriptions xmlns:wcs="http://www.opengis.net/wcs/2.0" xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:gmlcov="http://www.opengis.net/gmlcov/1.0" xmlns:swe="http://www.opengis.net/swe/2.0">
  <wcs:CoverageDescription gml:id="Elevacion4258_5">
    <gml:boundedBy>
      <gml:Envelope srsName="http://www.opengis.net/def/crs/EPSG/0/4258" axisLabels="Lat Long" uomLabels="deg deg" srsDimension="2">
        <gml:lowerCorner>27.5 -18.5</gml:lowerCorner>
        <gml:upperCorner>44.0 4.5</gml:upperCorner>
      </gml:Envelope>
    </gml:boundedBy>
    <wcs:CoverageId>Elevacion4258_5</wcs:CoverageId>
    <gml:domainSet>
      <gml:RectifiedGrid gml:id="grid" dimension="2">
        <gml:limits>
          <gml:GridEnvelope><gml:low>0 0</gml:low><gml:high>3299 4599</gml:high></gml:GridEnvelope>
        </gml:limits>
        <gml:axisLabels>Lat Long</gml:axisLabels>
        <gml:origin><gml:Point gml:id="origin"><gml:pos>44.0 -18.5</gml:pos></gml:Point></gml:origin>
        <gml:offsetVector>-0.005 0</gml:offsetVector>
        <gml:offsetVector>0 0.005</gml:offsetVector>
      </gml:RectifiedGrid>
    </gml:domainSet>
    <gmlcov:rangeType>
      <swe:DataRecord>
        <swe:field name="Elevation">
          <swe:Quantity><swe:label>Height above sea level</swe:label><swe:uom code="m"/></swe:Quantity>
        </swe:field>
      </swe:DataRecord>
    </gmlcov:rangeType>
    <wcs:ServiceParameters>
      <wcs:CoverageSubtype>RectifiedGridCoverage</wcs:CoverageSubtype>
      <wcs:nativeFormat>image/tiff</wcs:nativeFormat>
    </wcs:ServiceParameters>
  </wcs:CoverageDescription>
</wcs:CoverageDescriptions>"#;

    pub fn mock() -> MockHttp {
        MockHttp::new()
            .route(CAPABILITIES_URL, CAPABILITIES)
            .route(DESCRIBE_URL, DESCRIBE)
    }
}

/// WCS 1.0.0 offering `MDT05`.
pub mod wcs_legacy {
    use super::MockHttp;

    pub const BASE_URL: &str = "https://example.org/wcs-legacy";

    pub const CAPABILITIES_URL: &str =
        "https://example.org/wcs-legacy?service=WCS&version=1.0.0&request=GetCapabilities";

    pub const DESCRIBE_URL: &str = "https://example.org/wcs-legacy?service=WCS&version=1.0.0&request=DescribeCoverage&coverage=MDT05";

    pub const CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WCS_Capabilities xmlns="http://www.opengis.net/wcs" xmlns:gml="http://www.opengis.net/gml" version="1.0.0">
  <Service>
    <name>WCS</name>
    <label>MDT legacy</label>
    <description>Elevation models</description>
  </Service>
  <Capability>
    <Request><GetCapabilities/><DescribeCoverage/><GetCoverage/></Request>
  </Capability>
  <ContentMetadata>
    <CoverageOfferingBrief>
      <name>MDT05</name>
      <label>Digital terrain model 5 m</label>
      <lonLatEnvelope srsName="urn:ogc:def:crs:OGC:1.3:CRS84">
        <gml:pos>-19.0 26.0</gml:pos>
        <gml:pos>5.0 44.5</gml:pos>
      </lonLatEnvelope>
    </CoverageOfferingBrief>
  </ContentMetadata>
</WCS_Capabilities>"#;

    pub const DESCRIBE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CoverageDescription xmlns="http://www.opengis.net/wcs" xmlns:gml="http://www.opengis.net/gml" version="1.0.0">
  <CoverageOffering>
    <name>MDT05</name>
    <label>Digital terrain model 5 m</label>
    <domainSet>
      <spatialDomain>
        <gml:Envelope srsName="EPSG:4258">
          <gml:pos>-19.0 26.0</gml:pos>
          <gml:pos>5.0 44.5</gml:pos>
        </gml:Envelope>
      </spatialDomain>
    </domainSet>
    <rangeSet><RangeSet><name>elevation</name><label>Elevation</label></RangeSet></rangeSet>
    <supportedCRSs>
      <requestResponseCRSs>EPSG:4258</requestResponseCRSs>
      <nativeCRSs>EPSG:4258</nativeCRSs>
    </supportedCRSs>
    <supportedFormats nativeFormat="GeoTIFF"><formats>GeoTIFF</formats></supportedFormats>
    <supportedInterpolations default="nearest neighbor">
      <interpolationMethod>nearest neighbor</interpolationMethod>
      <interpolationMethod>bilinear</interpolationMethod>
    </supportedInterpolations>
  </CoverageOffering>
</CoverageDescription>"#;

    pub fn mock() -> MockHttp {
        MockHttp::new()
            .route(CAPABILITIES_URL, CAPABILITIES)
            .route(DESCRIBE_URL, DESCRIBE)
    }
}

/// OGC API Features service with collections `address` and `postalcode`.
pub mod ogcapi {
    use super::MockHttp;

    pub const BASE_URL: &str = "https://example.org/ogcapi";

    pub const OPENAPI_URL: &str = "https://example.org/ogcapi/openapi?f=json";
    pub const API_URL: &str = "https://example.org/ogcapi/api?f=json";
    pub const COLLECTIONS_URL: &str = "https://example.org/ogcapi/collections?f=json";
    pub const ADDRESS_URL: &str = "https://example.org/ogcapi/collections/address?f=json";

    pub const OPENAPI: &str = r##"{
  "openapi": "3.0.2",
  "info": {"title": "Direcciones y codigos postales", "description": "Addresses", "version": "1.0.0"},
  "paths": {
    "/": {"get": {"parameters": [{"$ref": "#/components/parameters/f"}]}},
    "/collections": {"get": {"parameters": [{"$ref": "#/components/parameters/f"}]}},
    "/collections/{collectionId}/items": {
      "get": {
        "parameters": [
          {"$ref": "#/components/parameters/collectionId"},
          {"$ref": "#/components/parameters/f"},
          {"$ref": "#/components/parameters/bbox"},
          {"$ref": "#/components/parameters/bbox-crs"},
          {"$ref": "#/components/parameters/crs"},
          {"$ref": "#/components/parameters/limit"},
          {"name": "postal_code", "in": "query", "required": false, "schema": {"type": "string"}}
        ]
      }
    }
  },
  "components": {
    "parameters": {
      "collectionId": {"name": "collectionId", "in": "path", "required": true, "schema": {"type": "string"}},
      "f": {"name": "f", "in": "query", "schema": {"type": "string", "enum": ["json", "html"]}},
      "bbox": {"name": "bbox", "in": "query", "schema": {"type": "array"}},
      "bbox-crs": {"name": "bbox-crs", "in": "query", "schema": {"type": "string"}},
      "crs": {"name": "crs", "in": "query", "schema": {"type": "string"}},
      "limit": {"$ref": "#/components/parameters/limitDefinition"},
      "limitDefinition": {"name": "limit", "in": "query", "schema": {"type": "integer"}}
    }
  }
}"##;

    pub const COLLECTIONS: &str = r##"{
  "crs": ["http://www.opengis.net/def/crs/OGC/1.3/CRS84", "http://www.opengis.net/def/crs/EPSG/0/4258"],
  "collections": [
    {"id": "address", "title": "Addresses", "crs": ["#/crs", "http://www.opengis.net/def/crs/EPSG/0/25830"]},
    {"id": "postalcode", "title": "Postal codes", "crs": ["http://www.opengis.net/def/crs/OGC/1.3/CRS84"]}
  ]
}"##;

    pub const ADDRESS: &str = r##"{
  "id": "address",
  "title": "Addresses",
  "crs": ["#/crs", "http://www.opengis.net/def/crs/EPSG/0/25830"]
}"##;

    pub fn mock() -> MockHttp {
        MockHttp::new()
            .route(OPENAPI_URL, OPENAPI)
            .route(COLLECTIONS_URL, COLLECTIONS)
            .route(ADDRESS_URL, ADDRESS)
    }
}

/// Two Atom feeds linking to each other; feed B lists the datasets.
pub mod atom {
    use super::MockHttp;

    pub const FEED_A_URL: &str = "https://example.org/atom/feed-a.xml";
    pub const FEED_B_URL: &str = "https://example.org/atom/feed-b.xml";
    pub const GML_URL: &str = "https://example.org/data/NamedPlaces.gml";
    pub const ZIP_URL: &str = "https://example.org/data/Addresses.zip";
    pub const METADATA_URL: &str = "https://example.org/metadata/dataset.xml";

    pub const FEED_A: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="es">
  <title>Download service</title>
  <link href="https://example.org/atom/feed-a.xml" rel="self" type="application/atom+xml"/>
  <entry>
    <title>Geographical names</title>
    <link href="https://example.org/metadata/dataset.xml" rel="describedby" type="application/vnd.iso.19139+xml"/>
    <link href="https://example.org/atom/feed-b.xml" rel="alternate" type="application/atom+xml"/>
  </entry>
</feed>"#;

    pub const FEED_B: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="es">
  <title>Geographical names dataset feed</title>
  <entry>
    <title>Back to the service feed</title>
    <link href="https://example.org/atom/feed-a.xml" rel="up" type="application/atom+xml"/>
  </entry>
  <entry>
    <title>Named places</title>
    <link href="https://example.org/data/NamedPlaces.gml" rel="alternate" type="application/gml+xml"/>
    <link href="https://example.org/data/Addresses.zip" rel="alternate" type="application/zip"/>
    <link href="https://example.org/metadata/dataset.xml" rel="describedby" type="application/xml"/>
  </entry>
</feed>"#;

    /// GML with a character outside ISO-8859-1 (`€`) next to Latin-1 ones.
    pub const NAMED_PLACES_GML: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:gn="http://inspire.ec.europa.eu/schemas/gn/4.0">
  <wfs:member><gn:NamedPlace><gn:text>Catauña €</gn:text></gn:NamedPlace></wfs:member>
</wfs:FeatureCollection>"#;

    /// Both feeds and the plain GML leaf; the zip leaf is left to the caller.
    pub fn mock() -> MockHttp {
        MockHttp::new()
            .route(FEED_A_URL, FEED_A)
            .route(FEED_B_URL, FEED_B)
            .route(GML_URL, NAMED_PLACES_GML)
    }
}

/// An OWS exception report.
pub const EXCEPTION_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="2.0.0">
  <ows:Exception exceptionCode="InvalidParameterValue" locator="version">
    <ows:ExceptionText>Version 9.9.9 is not supported</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;
