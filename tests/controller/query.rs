use axum::http::StatusCode;
use insta::assert_json_snapshot;
use neurobagel_api::{
    graph::{GraphError, QuerySolutions, RdfTerm},
    testing,
    tests_cfg::{
        self,
        graph::{FakeGraph, COHORT, DATASET_SIZES},
    },
};
use rstest::rstest;
use serde_json::Value;

const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

fn dataset(n: usize) -> String {
    format!("http://neurobagel.org/vocab/ds{n:04}")
}

/// One matching subject per dataset.
fn cohort_rows(datasets: usize) -> QuerySolutions {
    QuerySolutions::from_rows(
        &["dataset_uuid", "dataset_name", "sub_id", "image_modal"],
        (0..datasets).map(|n| {
            vec![
                ("dataset_uuid", RdfTerm::uri(dataset(n))),
                ("dataset_name", RdfTerm::literal(format!("Dataset {n}"))),
                (
                    "dataset_portal_uri",
                    RdfTerm::uri(format!("https://example.org/portal/{n}")),
                ),
                ("sub_id", RdfTerm::literal("sub-01")),
                (
                    "image_modal",
                    RdfTerm::uri("http://purl.org/nidash/nidm#T1Weighted"),
                ),
            ]
        }),
    )
}

fn dataset_sizes(datasets: usize) -> QuerySolutions {
    QuerySolutions::from_rows(
        &["dataset_uuid", "total_subjects"],
        (0..datasets).map(|n| {
            vec![
                ("dataset_uuid", RdfTerm::uri(dataset(n))),
                ("total_subjects", RdfTerm::typed_literal("70", XSD_INTEGER)),
            ]
        }),
    )
}

fn graph_with(datasets: usize) -> FakeGraph {
    FakeGraph::new()
        .respond(COHORT, cohort_rows(datasets))
        .respond(DATASET_SIZES, dataset_sizes(datasets))
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(3)]
#[tokio::test]
async fn returns_one_entry_per_dataset(#[case] datasets: usize) {
    let ctx = tests_cfg::app::get_app_context_with_graph(graph_with(datasets)).await;

    let (status, body) = testing::get_json(ctx, "/query?sex=snomed:248152002").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(datasets));
}

#[tokio::test]
async fn aggregate_response_shape() {
    let ctx = tests_cfg::app::get_app_context_with_graph(graph_with(1)).await;

    let (status, body) = testing::get_json(ctx, "/query/").await;

    assert_eq!(status, StatusCode::OK);
    assert_json_snapshot!(body, @r###"
    [
      {
        "dataset_name": "Dataset 0",
        "dataset_portal_uri": "https://example.org/portal/0",
        "dataset_total_subjects": 70,
        "dataset_uuid": "http://neurobagel.org/vocab/ds0000",
        "image_modals": [
          "http://purl.org/nidash/nidm#T1Weighted"
        ],
        "num_matching_subjects": 1,
        "records_protected": true,
        "subject_data": "protected"
      }
    ]
    "###);
}

#[tokio::test]
async fn detail_mode_returns_session_records() {
    let mut ctx = tests_cfg::app::get_app_context_with_graph(graph_with(2)).await;
    ctx.config.query.return_agg = false;

    let (status, body) = testing::get_json(ctx, "/query").await;

    assert_eq!(status, StatusCode::OK);
    let first = &body[0];
    assert_eq!(first["records_protected"], false);
    assert_eq!(first["subject_data"][0]["sub_id"], "sub-01");
    assert_eq!(first["subject_data"][0]["session_id"], Value::Null);
    assert_eq!(
        first["subject_data"][0]["image_modal"],
        serde_json::json!(["http://purl.org/nidash/nidm#T1Weighted"])
    );
}

#[tokio::test]
async fn sizes_are_only_queried_for_matches() {
    let graph = graph_with(0);
    let ctx = tests_cfg::app::get_app_context_with_graph(graph.clone()).await;

    let (status, _) = testing::get_json(ctx, "/query").await;

    assert_eq!(status, StatusCode::OK);
    let queries = graph.queries();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].contains("?sub_id"));
}

#[tokio::test]
async fn repeated_queries_are_identical() {
    let graph = graph_with(2);
    let ctx = tests_cfg::app::get_app_context_with_graph(graph.clone()).await;
    let uri = "/query?min_age=30.5&max_age=60&image_modal=nidm:T1Weighted&is_control=false";

    let (_, first) = testing::get_json(ctx.clone(), uri).await;
    let (_, second) = testing::get_json(ctx, uri).await;

    assert_eq!(first, second);
    let queries = graph.queries();
    assert_eq!(queries.len(), 4);
    assert_eq!(queries[0], queries[2]);
    assert_eq!(queries[1], queries[3]);
}

#[tokio::test]
async fn filters_reach_the_graph_as_iris() {
    let graph = graph_with(1);
    let ctx = tests_cfg::app::get_app_context_with_graph(graph.clone()).await;

    let (status, _) = testing::get_json(ctx, "/query?diagnosis=snomed:35489007").await;

    assert_eq!(status, StatusCode::OK);
    assert!(graph.queries()[0]
        .contains("nb:hasDiagnosis <http://purl.bioontology.org/ontology/SNOMEDCT/35489007>"));
}

#[rstest]
#[case("min_age=forty&max_age=fifty")]
#[case("min_age=33&max_age=21")]
#[case("min_age=-42.5&max_age=-40")]
#[case("min_age=NaN")]
#[case("max_age=inf")]
#[case("sex=apple")]
#[case("diagnosis=sn0med:35489007")]
#[case("diagnosis=:123456")]
#[case("is_control=apple")]
#[case("min_num_phenotypic_sessions=-3")]
#[case("min_num_imaging_sessions=2.5")]
#[case("min_num_imaging_sessions=apple")]
#[case("assessment=bg01:cogAtlas-1234")]
#[case("image_modal=2nim:EEG")]
#[case("image_modal=dbo:abstract")]
#[case("species=human")]
#[tokio::test]
async fn invalid_parameters_are_unprocessable(#[case] query: &str) {
    let graph = graph_with(1);
    let ctx = tests_cfg::app::get_app_context_with_graph(graph.clone()).await;

    let (status, body) = testing::get_json(ctx, &format!("/query?{query}")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{query}: {body}");
    assert_eq!(body["error"], "validation_error");
    assert!(graph.queries().is_empty());
}

#[tokio::test]
async fn healthy_controls_cannot_have_a_diagnosis() {
    let ctx = tests_cfg::app::get_app_context().await;

    let (status, body) =
        testing::get_json(ctx, "/query?diagnosis=snomed:35489007&is_control=True").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["description"]
        .as_str()
        .is_some_and(|d| d.contains("Subjects cannot both be healthy controls and have a diagnosis")));
}

#[tokio::test]
async fn graph_authentication_failure_is_unauthorized() {
    let graph = FakeGraph::new().fail_all(GraphError::Authentication {
        body: "wrong password".to_string(),
    });
    let ctx = tests_cfg::app::get_app_context_with_graph(graph).await;

    let (status, body) = testing::get_json(ctx, "/query?sex=snomed:248152002").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["description"]
        .as_str()
        .is_some_and(|d| d.starts_with("Unauthorized: ")));
}

#[tokio::test]
async fn upstream_status_is_passed_through() {
    let graph = FakeGraph::new().fail_all(GraphError::Upstream {
        status: StatusCode::BAD_REQUEST,
        reason: "Bad Request".to_string(),
        body: "MALFORMED QUERY".to_string(),
    });
    let ctx = tests_cfg::app::get_app_context_with_graph(graph).await;

    let (status, body) = testing::get_json(ctx, "/query").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["description"], "Bad Request: MALFORMED QUERY");
}

#[tokio::test]
async fn unreachable_graph_is_a_server_error() {
    let graph = FakeGraph::new().fail_all(GraphError::Transport("connection refused".to_string()));
    let ctx = tests_cfg::app::get_app_context_with_graph(graph).await;

    let (status, body) = testing::get_json(ctx, "/query").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "transport_error");
}
