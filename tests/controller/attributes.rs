use axum::http::StatusCode;
use neurobagel_api::{
    graph::{QuerySolutions, RdfTerm},
    testing,
    tests_cfg::{
        self,
        graph::{FakeGraph, ATTRIBUTES, ATTRIBUTE_TERMS},
    },
};
use rstest::rstest;
use serde_json::json;

fn column(var: &'static str, iris: &[&str]) -> QuerySolutions {
    QuerySolutions::from_rows(
        &[var],
        iris.iter().map(|iri| vec![(var, RdfTerm::uri(*iri))]),
    )
}

#[tokio::test]
async fn lists_compacted_attributes() {
    let graph = FakeGraph::new().respond(
        ATTRIBUTES,
        column(
            "attribute",
            &[
                "http://neurobagel.org/vocab/ControlledTerm1",
                "http://neurobagel.org/vocab/ControlledTerm2",
                "http://neurobagel.org/vocab/ControlledTerm3",
            ],
        ),
    );
    let ctx = tests_cfg::app::get_app_context_with_graph(graph).await;

    let (status, body) = testing::get_json(ctx, "/attributes/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!(["nb:ControlledTerm1", "nb:ControlledTerm2", "nb:ControlledTerm3"])
    );
}

#[tokio::test]
async fn terms_carry_labels_and_skip_unknown_namespaces() {
    let graph = FakeGraph::new().respond(
        ATTRIBUTE_TERMS,
        column(
            "termURL",
            &[
                "https://www.cognitiveatlas.org/task/id/tsk_U9gDp8utahAfO",
                "https://www.cognitiveatlas.org/task/id/not_found_id",
                "https://www.notanatlas.org/task/id/tsk_alz5hjlUXp4WY",
            ],
        ),
    );
    let ctx = tests_cfg::app::get_app_context_with_graph(graph.clone()).await;

    let (status, body) = testing::get_json(ctx, "/attributes/nb:Assessment").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "nb:Assessment": [
                {"TermURL": "cogatlas:tsk_U9gDp8utahAfO", "Label": "Pittsburgh Stress Battery"},
                {"TermURL": "cogatlas:not_found_id", "Label": null}
            ]
        })
    );
    assert!(graph.queries()[0].contains("?termURL a <http://neurobagel.org/vocab/Assessment>"));
}

#[tokio::test]
async fn terms_without_lookup_table_have_no_label() {
    let graph = FakeGraph::new().respond(
        ATTRIBUTE_TERMS,
        column(
            "termURL",
            &[
                "http://purl.org/nidash/nidm#T1Weighted",
                "http://purl.org/nidash/nidm#T2Weighted",
            ],
        ),
    );
    let ctx = tests_cfg::app::get_app_context_with_graph(graph).await;

    let (status, body) = testing::get_json(ctx, "/attributes/nb:SomeClass").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "nb:SomeClass": [
                {"TermURL": "nidm:T1Weighted", "Label": null},
                {"TermURL": "nidm:T2Weighted", "Label": null}
            ]
        })
    );
}

#[rstest]
#[case("apple")]
#[case("some_thing:cool")]
#[case("dbo:abstract")]
#[tokio::test]
async fn malformed_attributes_are_unprocessable(#[case] attribute: &str) {
    let ctx = tests_cfg::app::get_app_context().await;

    let (status, body) = testing::get_json(ctx, &format!("/attributes/{attribute}")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["param"], "data_element_uri");
}

#[tokio::test]
async fn describes_attribute_vocabulary() {
    let ctx = tests_cfg::app::get_app_context().await;

    let (status, body) = testing::get_json(ctx, "/attributes/nb:Assessment/vocab").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vocabulary_name"], "Cognitive Atlas Tasks");
    assert_eq!(body["namespace_url"], "https://www.cognitiveatlas.org/task/id/");
    assert_eq!(body["namespace_prefix"], "cogatlas");
    assert_eq!(
        body["term_labels"]["tsk_ccTKYnmv7tOZY"],
        "Verbal Interference Test"
    );
}

#[tokio::test]
async fn unknown_vocabulary_is_not_found() {
    let ctx = tests_cfg::app::get_app_context().await;

    let (status, body) = testing::get_json(ctx, "/attributes/nb:Sex/vocab").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
