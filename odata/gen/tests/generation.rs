//! End-to-end generation over CSDL fixtures.
//!
//! These tests run whole generation passes (fetch, parse, dispatch, render)
//! and assert on the formatted artifacts that reach the sink.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use odata_gen::config::{EnumDedupPolicy, GeneratorConfig};
use odata_gen::output::{DirectorySink, INDEX_FILE, MemorySink, OutputSink};
use odata_gen::pass::{GenerationPass, GenerationReport, RequestOutcome};
use odata_gen::request::GenerationRequest;
use odata_gen::source::{FileMetadataSource, InMemoryMetadataSource};

const TRIPPIN: &str = include_str!("fixtures/trippin.xml");
const SHARED_A: &str = include_str!("fixtures/shared_a.xml");
const SHARED_B: &str = include_str!("fixtures/shared_b.xml");
const SHADOWING: &str = include_str!("fixtures/shadowing.xml");

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn sources() -> InMemoryMetadataSource {
    InMemoryMetadataSource::new()
        .with_document("trippin", TRIPPIN)
        .with_document("shared_a", SHARED_A)
        .with_document("shared_b", SHARED_B)
        .with_document("shadowing", SHADOWING)
}

fn trippin_request() -> GenerationRequest {
    GenerationRequest::new("trippin", "TripPinService", "Trippin")
}

fn shared_requests() -> Vec<GenerationRequest> {
    vec![
        GenerationRequest::new("shared_a", "SalesService", "Sales"),
        GenerationRequest::new("shared_b", "PurchasingService", "Purchasing"),
    ]
}

fn generate(
    config: GeneratorConfig,
    requests: &[GenerationRequest],
) -> (GenerationReport, MemorySink) {
    let mut pass = GenerationPass::new(config).expect("valid config");
    let mut sink = MemorySink::new();
    let report = pass.run(requests, &sources(), &mut sink);
    (report, sink)
}

fn text<'a>(sink: &'a MemorySink, key: &str) -> &'a str {
    &sink
        .get(key)
        .unwrap_or_else(|| panic!("missing artifact {key}; have {:?}", sink.keys()))
        .text
}

#[test]
fn trippin_emits_every_supported_element_in_document_order() {
    let (report, sink) = generate(GeneratorConfig::default(), &[trippin_request()]);

    assert_eq!(report.succeeded(), 1);
    assert_eq!(
        sink.keys(),
        vec![
            "Trippin.Color",
            "Trippin.Feature",
            "Trippin.Address",
            "Trippin.AirportInfo",
            "Trippin.Person",
            "Trippin.Manager",
            "Trippin.Event",
            "Trippin.TripPinService",
        ]
    );
    for artifact in &sink.artifacts {
        assert!(
            artifact
                .text
                .starts_with("// This code was automatically generated by odata-gen."),
            "{} lacks the generated notice",
            artifact.key
        );
    }
}

#[test]
fn enum_members_keep_values_and_order() {
    let (_, sink) = generate(GeneratorConfig::default(), &[trippin_request()]);
    let color = text(&sink, "Trippin.Color");

    assert!(color.contains("pub enum Color"));
    let red = color.find("Red = 0").expect("Red");
    let green = color.find("Green = 1").expect("Green");
    let blue = color.find("Blue = 4").expect("Blue");
    assert!(red < green && green < blue);
}

#[test]
fn flags_enum_becomes_bit_set() {
    let (_, sink) = generate(GeneratorConfig::default(), &[trippin_request()]);
    let feature = text(&sink, "Trippin.Feature");

    assert!(feature.contains("pub struct Feature(pub i16);"));
    assert!(feature.contains("pub const Parking: Self = Self(4);"));
    assert!(feature.contains("impl ::odata_client::Flags for Feature"));
}

#[test]
fn entity_marks_key_and_keeps_nullable_string_plain() {
    let (_, sink) = generate(GeneratorConfig::default(), &[trippin_request()]);
    let person = text(&sink, "Trippin.Person");

    let marker = person.find("/// Key property.").expect("key marker");
    let id = person.find("pub Id: i32").expect("Id field");
    assert!(marker < id);
    assert!(person.contains("const KEY_PROPERTIES: &'static [&'static str] = &[\"Id\"];"));

    assert!(person.contains("pub Name: ::std::string::String"));
    assert!(!person.contains("pub Name: ::core::option::Option<::std::string::String>"));
    assert!(person.contains("pub Age: ::core::option::Option<i32>"));
    assert!(person.contains("pub FavoriteColor: crate::trippin::Color"));
    assert!(person.contains("pub Emails: ::std::vec::Vec<::std::string::String>"));
    assert!(person.contains("pub Photo: ::std::vec::Vec<u8>"));
    assert!(person.contains(
        "pub Born: ::core::option::Option<::odata_client::chrono::DateTime<::odata_client::chrono::FixedOffset>>"
    ));
    assert!(person.contains("pub Friends: ::std::vec::Vec<crate::trippin::Person>"));
    assert!(person.contains("pub BestFriend: ::core::option::Option<::std::boxed::Box<crate::trippin::Person>>"));
}

#[test]
fn derived_and_open_entities() {
    let (_, sink) = generate(GeneratorConfig::default(), &[trippin_request()]);

    let manager = text(&sink, "Trippin.Manager");
    assert!(manager.contains("pub base: crate::trippin::Person,"));
    assert!(manager.contains("pub Budget: i64"));
    assert!(manager.contains("<crate::trippin::Person as ::odata_client::EntityKey>::KEY_PROPERTIES"));

    let event = text(&sink, "Trippin.Event");
    assert!(event.contains("impl ::odata_client::OpenType for Event"));
    assert!(event.contains("pub EventId: ::odata_client::Guid"));
    assert!(event.contains("pub Length: ::std::time::Duration"));
    assert!(event.contains("pub Starts: ::core::option::Option<::odata_client::chrono::NaiveDate>"));
}

#[test]
fn facade_exposes_entity_sets() {
    let (_, sink) = generate(GeneratorConfig::default(), &[trippin_request()]);
    let facade = text(&sink, "Trippin.TripPinService");

    assert!(facade.contains("pub struct TripPinService"));
    assert!(facade.contains(
        "pub fn People(&self) -> ::odata_client::BoundClient<crate::trippin::Person>"
    ));
    assert!(facade.contains("self.client.for_set::<crate::trippin::Person>(\"People\")"));
    assert!(facade.contains("for_set::<crate::trippin::Event>(\"Events\")"));
    assert_eq!(facade.matches(".with_properties()").count(), 1);
}

#[test]
fn facade_calls_unbound_functions() {
    let (_, sink) = generate(GeneratorConfig::default(), &[trippin_request()]);
    let facade = text(&sink, "Trippin.TripPinService");

    assert!(facade.contains("pub async fn GetNearestAirport("));
    assert!(facade.contains("lat: f64"));
    assert!(facade.contains("lon: f64"));
    assert!(facade.contains(
        "::core::result::Result<::core::option::Option<crate::trippin::AirportInfo>, ::odata_client::ODataError>"
    ));
    assert!(facade.contains(".execute_as_single::<::core::option::Option<crate::trippin::AirportInfo>>()"));

    assert!(facade.contains("color: crate::trippin::Color"));
    assert!(facade.contains(
        "::core::result::Result<::std::vec::Vec<crate::trippin::Person>, ::odata_client::ODataError>"
    ));
    assert!(facade.contains(".execute_as_array::<crate::trippin::Person>()"));

    assert!(!facade.contains("GetFriendsTrips"), "bound functions are not exposed");
    assert!(!facade.contains("ResetDataSource"), "actions are not generated");
}

#[test]
fn module_root_prefixes_type_paths() {
    let config = GeneratorConfig {
        module_root: "crate::odata".to_string(),
        ..Default::default()
    };
    let (_, sink) = generate(config, &[trippin_request()]);

    let facade = text(&sink, "Trippin.TripPinService");
    assert!(facade.contains("::odata_client::BoundClient<crate::odata::trippin::Person>"));
}

#[test]
fn shared_declarations_are_emitted_once() {
    let (report, sink) = generate(GeneratorConfig::default(), &shared_requests());

    assert_eq!(report.succeeded(), 2);
    assert_eq!(
        sink.keys(),
        vec![
            "Shared.Status",
            "Shared.Address",
            "Sales.Customer",
            "Sales.SalesService",
            "Purchasing.Supplier",
            "Purchasing.PurchasingService",
        ]
    );

    let RequestOutcome::Generated { artifacts, .. } = &report.outcomes[1] else {
        panic!("second request should succeed");
    };
    assert!(!artifacts.iter().any(|key| key == "Shared.Address"));
}

#[test]
fn legacy_policy_reemits_short_enum_keys() {
    let config = GeneratorConfig {
        enum_dedup: EnumDedupPolicy::Legacy,
        ..Default::default()
    };
    let (_, sink) = generate(config, &shared_requests());

    let statuses: Vec<_> = sink
        .artifacts
        .iter()
        .filter(|a| a.key == "Shared.Status")
        .collect();
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].text, statuses[1].text);
    assert_eq!(sink.keys().iter().filter(|k| **k == "Shared.Address").count(), 1);
}

#[test]
fn prelude_named_types_do_not_shadow_library_types() {
    let request = GenerationRequest::new("shadowing", "ShopService", "Shop");
    let (report, sink) = generate(GeneratorConfig::default(), &[request]);
    assert!(!report.has_failures(), "{:?}", report.outcomes);

    let option = text(&sink, "Shop.Option");
    assert!(option.contains("pub struct Option {"));
    assert!(option.contains("pub Weight: ::core::option::Option<f64>"));

    let product = text(&sink, "Shop.Product");
    assert!(product.contains("pub Id: ::odata_client::Guid"));
    assert!(product.contains("pub Price: ::core::option::Option<f64>"));
    assert!(product.contains("pub Choice: ::core::option::Option<crate::shop::Option>"));
    assert!(product.contains("pub Caption: crate::shop::String"));
    assert!(product.contains("pub Packaging: ::core::option::Option<crate::shop::Box>"));
    assert!(product.contains("pub Offset: ::core::option::Option<crate::shop::Vec>"));
    assert!(product.contains("pub Flags: ::core::option::Option<crate::shop::u8_>"));
    assert!(product.contains("pub Outcome: crate::shop::Result"));
    assert!(product.contains("pub Tags: ::std::vec::Vec<::std::string::String>"));
    assert!(product.contains("skip_serializing_if = \"::std::vec::Vec::is_empty\""));
    assert!(!product.contains(": Option<"));
    assert!(!product.contains(": Vec<"));
    assert!(!product.contains(": String"));

    assert!(text(&sink, "Shop.u8").contains("pub struct u8_ {"));
    assert!(text(&sink, "Shop.Result").contains("pub enum Result {"));

    let facade = text(&sink, "Shop.ShopService");
    assert!(facade.contains("choice: crate::shop::Option"));
    assert!(facade.contains("tags: ::std::vec::Vec<::std::string::String>"));
    assert!(facade.contains(
        "::core::result::Result<::std::vec::Vec<crate::shop::Product>, ::odata_client::ODataError>"
    ));
    assert!(facade.contains("id: ::odata_client::Guid"));
}

#[test]
fn recursive_complex_types_are_boxed() {
    let request = GenerationRequest::new("shadowing", "ShopService", "Shop");
    let (_, sink) = generate(GeneratorConfig::default(), &[request]);

    let node = text(&sink, "Shop.Node");
    assert!(node.contains("pub Parent: ::core::option::Option<::std::boxed::Box<crate::shop::Node>>"));
    assert!(node.contains("pub Children: ::std::vec::Vec<crate::shop::Node>"));

    let left = text(&sink, "Shop.Left");
    assert!(left.contains("pub Right: ::core::option::Option<::std::boxed::Box<crate::shop::Right>>"));
    let right = text(&sink, "Shop.Right");
    assert!(right.contains("pub Left: ::core::option::Option<::std::boxed::Box<crate::shop::Left>>"));

    let product = text(&sink, "Shop.Product");
    assert!(product.contains("pub Category: ::core::option::Option<crate::shop::Node>"));
}

#[test]
fn failed_request_is_isolated() {
    let requests = vec![
        GenerationRequest::new("missing", "Missing", "Missing"),
        trippin_request(),
    ];
    let (report, sink) = generate(GeneratorConfig::default(), &requests);

    assert!(report.has_failures());
    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded(), 1);
    assert!(sink.get("Trippin.TripPinService").is_some());
}

#[test]
fn file_source_and_directory_sink() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("odata");
    let request = GenerationRequest::new(
        fixture("trippin.xml").display().to_string(),
        "TripPinService",
        "Trippin",
    );

    let mut pass = GenerationPass::new(GeneratorConfig::default()).unwrap();
    let mut sink = DirectorySink::new(&out);
    let report = pass.run(&[request], &FileMetadataSource, &mut sink);
    sink.finish().unwrap();

    assert_eq!(report.succeeded(), 1);
    assert!(out.join("Trippin.Person.rs").exists());
    assert!(out.join("Trippin.TripPinService.rs").exists());

    let index = fs::read_to_string(out.join(INDEX_FILE)).unwrap();
    assert!(index.contains("pub mod trippin {"));
    assert!(index.contains("include!(\"Trippin.Color.rs\");"));
    assert!(index.contains("include!(\"Trippin.TripPinService.rs\");"));
}
