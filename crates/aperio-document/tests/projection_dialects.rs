//! Integration test: one definition set projected into all four
//! dialects, checking the structural differences between them.

use serde_json::json;

use aperio_core::{Status, StatusRange};
use aperio_document::{
    best_match, document_digest, to_document, DocVersion, DocumentInfo, ToDocument,
};
use aperio_schema::{
    Definitions, HttpScheme, MediaTypeObject, Method, Operation, Parameter, ParameterLocation,
    RequestBody, Response, Schema, SchemaKind, SecurityScheme, Server, Validator,
};

fn sample_defs() -> Definitions {
    let mut defs = Definitions::new();

    defs.add_schema(
        "Pet",
        Schema::builder(SchemaKind::Object)
            .property(
                "name",
                Schema::builder(SchemaKind::String)
                    .validator(Validator::min_length(1))
                    .build()
                    .unwrap(),
            )
            .property(
                "kind",
                Schema::builder(SchemaKind::String).build().unwrap(),
            )
            .build()
            .unwrap(),
    )
    .unwrap();

    defs.add_security_scheme(
        "token",
        SecurityScheme::Http {
            scheme: HttpScheme::Bearer,
            bearer_format: Some("JWT".into()),
        },
    )
    .unwrap();
    defs.add_security_scheme(
        "legacy",
        SecurityScheme::ApiKey {
            name: "X-Api-Key".into(),
            location: ParameterLocation::Header,
        },
    )
    .unwrap();

    defs.add_server(Server::new("https://api.example.com").name("primary"))
        .unwrap();

    let list = Operation::builder(Method::Get, "/pets")
        .operation_id("listPets")
        .parameter(Parameter::new(
            "limit",
            ParameterLocation::Query,
            Schema::builder(SchemaKind::Integer)
                .validator(Validator::minimum(&json!(1)).unwrap())
                .build()
                .unwrap(),
        ))
        .response(Status::Default, Response::new("unexpected"))
        .response(Status::Range(StatusRange::ClientError), Response::new("bad request"))
        .response(
            Status::Code(200),
            Response::new("a page of pets")
                .content("application/json", MediaTypeObject::new(Schema::reference("Pet"))),
        )
        .security("token")
        .build()
        .unwrap();
    defs.add_operation("listPets", list).unwrap();

    let create = Operation::builder(Method::Post, "/pets")
        .operation_id("createPet")
        .request_body(
            RequestBody::new()
                .required()
                .content("application/json", MediaTypeObject::new(Schema::reference("Pet")))
                .content("application/*", MediaTypeObject::new(Schema::reference("Pet"))),
        )
        .response(Status::Code(201), Response::new("created"))
        .build()
        .unwrap();
    defs.add_operation("createPet", create).unwrap();

    defs.freeze().unwrap();
    defs
}

#[test]
fn test_every_dialect_projects_without_error() {
    let defs = sample_defs();
    let info = DocumentInfo::new("Pets", "1.0.0");
    for version in DocVersion::all() {
        let doc = to_document(&defs, &info, version).unwrap();
        assert!(doc["paths"]["/pets"]["get"].is_object(), "{version}");
        assert!(doc["paths"]["/pets"]["post"].is_object(), "{version}");
    }
}

#[test]
fn test_string_schema_inline_vs_restructured() {
    let defs = Definitions::new();
    let schema = Schema::builder(SchemaKind::String).build().unwrap();
    let earliest = schema
        .to_document(&defs, DocVersion::Swagger2)
        .unwrap()
        .unwrap();
    assert_eq!(earliest, json!({"type": "string"}));

    let p = Parameter::new("q", ParameterLocation::Query, schema);
    let flat = p.to_document(&defs, DocVersion::Swagger2).unwrap().unwrap();
    let wrapped = p.to_document(&defs, DocVersion::V3_2).unwrap().unwrap();
    // Type information is inline or nested, never both at once.
    assert!(flat.get("type").is_some() && flat.get("schema").is_none());
    assert!(wrapped.get("schema").is_some() && wrapped.get("type").is_none());
}

#[test]
fn test_bearer_scheme_version_gated() {
    let defs = sample_defs();
    let info = DocumentInfo::new("Pets", "1.0.0");

    let v2 = to_document(&defs, &info, DocVersion::Swagger2).unwrap();
    let legacy_only = v2["securityDefinitions"].as_object().unwrap();
    assert!(legacy_only.get("token").is_none());
    assert_eq!(legacy_only["legacy"]["type"], json!("apiKey"));

    let v3 = to_document(&defs, &info, DocVersion::V3_0).unwrap();
    let schemes = v3["components"]["securitySchemes"].as_object().unwrap();
    assert_eq!(schemes["token"]["type"], json!("http"));
    assert_eq!(schemes["token"]["bearerFormat"], json!("JWT"));
}

#[test]
fn test_request_body_rendering_differs() {
    let defs = sample_defs();
    let info = DocumentInfo::new("Pets", "1.0.0");

    let v2 = to_document(&defs, &info, DocVersion::Swagger2).unwrap();
    let post = &v2["paths"]["/pets"]["post"];
    assert_eq!(
        post["consumes"],
        json!(["application/json", "application/*"])
    );
    assert_eq!(
        post["parameters"][0]["schema"]["$ref"],
        json!("#/definitions/Pet")
    );

    let v31 = to_document(&defs, &info, DocVersion::V3_1).unwrap();
    let post = &v31["paths"]["/pets"]["post"];
    assert!(post.get("consumes").is_none());
    assert_eq!(
        post["requestBody"]["content"]["application/json"]["schema"]["$ref"],
        json!("#/components/schemas/Pet")
    );
}

#[test]
fn test_responses_listed_most_specific_first() {
    let defs = sample_defs();
    let info = DocumentInfo::new("Pets", "1.0.0");
    let doc = to_document(&defs, &info, DocVersion::V3_0).unwrap();
    let keys: Vec<&String> = doc["paths"]["/pets"]["get"]["responses"]
        .as_object()
        .unwrap()
        .keys()
        .collect();
    assert_eq!(keys, vec!["200", "4XX", "default"]);
}

#[test]
fn test_server_name_appears_only_in_newest() {
    let defs = sample_defs();
    let info = DocumentInfo::new("Pets", "1.0.0");
    let v31 = to_document(&defs, &info, DocVersion::V3_1).unwrap();
    assert!(v31["servers"][0].get("name").is_none());
    let v32 = to_document(&defs, &info, DocVersion::V3_2).unwrap();
    assert_eq!(v32["servers"][0]["name"], json!("primary"));
}

#[test]
fn test_content_type_selection_against_declared_body() {
    let defs = sample_defs();
    let body = defs
        .operations()
        .find(|(name, _)| *name == "createPet")
        .and_then(|(_, op)| op.request_body.as_ref())
        .unwrap();
    let contents = match body {
        aperio_schema::RequestBodyRef::Inline(body) => &body.contents,
        other => panic!("expected inline body, got {other:?}"),
    };
    let declared = contents.keys().map(String::as_str);
    assert_eq!(
        best_match(declared, "application/xml"),
        Some("application/*")
    );
    let declared = contents.keys().map(String::as_str);
    assert_eq!(
        best_match(declared, "application/json; charset=utf-8"),
        Some("application/json")
    );
}

#[test]
fn test_digests_identify_dialect_documents() {
    let defs = sample_defs();
    let info = DocumentInfo::new("Pets", "1.0.0");
    let mut digests = Vec::new();
    for version in DocVersion::all() {
        let doc = to_document(&defs, &info, version).unwrap();
        digests.push(document_digest(&doc).unwrap().to_hex());
    }
    digests.sort();
    digests.dedup();
    assert_eq!(digests.len(), 4, "each dialect renders distinct content");
}
