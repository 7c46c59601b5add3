//! Reshapes graph bindings into the public `/query` response.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::template::ResultMode;
use crate::{
    graph::{GraphError, QuerySolutions, Solution},
    vocab::Iri,
};

/// Summary of the matches found in one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortQueryResponse {
    pub dataset_uuid: String,
    pub dataset_name: Option<String>,
    pub dataset_portal_uri: Option<String>,
    pub dataset_total_subjects: Option<u64>,
    pub records_protected: bool,
    pub num_matching_subjects: usize,
    pub subject_data: SubjectData,
    pub image_modals: Vec<String>,
}

/// Per-session records, or the marker `"protected"` when only aggregates may
/// be shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectData {
    Protected(Protected),
    Records(Vec<SessionRecord>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protected {
    Protected,
}

/// Everything known about one session of one matching subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub sub_id: String,
    pub session_id: Option<String>,
    pub session_type: Option<String>,
    pub session_file_path: Option<String>,
    pub age: Option<f64>,
    pub sex: Option<String>,
    pub diagnosis: Vec<String>,
    pub subject_group: Option<String>,
    pub assessment: Vec<String>,
    pub image_modal: Vec<String>,
    pub num_matching_phenotypic_sessions: Option<u64>,
    pub num_matching_imaging_sessions: Option<u64>,
}

#[derive(Default)]
struct DatasetAcc {
    name: Option<String>,
    portal_uri: Option<String>,
    /// Subject nodes; labels are not unique within a dataset.
    subjects: BTreeSet<String>,
    image_modals: BTreeSet<String>,
    sessions: BTreeMap<(String, Option<String>), SessionAcc>,
}

#[derive(Default)]
struct SessionAcc {
    sub_id: String,
    session_type: Option<String>,
    session_file_path: Option<String>,
    age: Option<f64>,
    sex: Option<String>,
    subject_group: Option<String>,
    num_matching_phenotypic_sessions: Option<u64>,
    num_matching_imaging_sessions: Option<u64>,
    diagnosis: BTreeSet<String>,
    assessment: BTreeSet<String>,
    image_modal: BTreeSet<String>,
}

fn value<'a>(row: &'a Solution, var: &str) -> Option<&'a str> {
    row.get(var).map(|term| term.value.as_str())
}

fn owned(row: &Solution, var: &str) -> Option<String> {
    value(row, var).map(ToString::to_string)
}

fn required<'a>(row: &'a Solution, var: &str) -> Result<&'a str, GraphError> {
    value(row, var)
        .ok_or_else(|| GraphError::MalformedResponse(format!("result row without `{var}`")))
}

fn number<T: std::str::FromStr>(row: &Solution, var: &str) -> Result<Option<T>, GraphError> {
    value(row, var)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| {
                GraphError::MalformedResponse(format!("`{var}` is not a number: {raw}"))
            })
        })
        .transpose()
}

/// Distinct dataset IRIs of the matching rows, sorted.
///
/// # Errors
///
/// Fails when a row has no `dataset_uuid` or it is not a valid IRI.
pub fn dataset_iris(solutions: &QuerySolutions) -> Result<Vec<Iri>, GraphError> {
    let mut iris = BTreeSet::new();
    for row in &solutions.results.bindings {
        let raw = required(row, "dataset_uuid")?;
        let iri = Iri::new(raw).map_err(|err| GraphError::MalformedResponse(err.to_string()))?;
        iris.insert(iri);
    }
    Ok(iris.into_iter().collect())
}

/// Parses the answer of the dataset-size query into IRI to subject count.
///
/// # Errors
///
/// Fails when a row lacks either column or the count is not an integer.
pub fn dataset_sizes(solutions: &QuerySolutions) -> Result<BTreeMap<String, u64>, GraphError> {
    solutions
        .results
        .bindings
        .iter()
        .map(|row| {
            let dataset = required(row, "dataset_uuid")?.to_string();
            let total = number::<u64>(row, "total_subjects")?.ok_or_else(|| {
                GraphError::MalformedResponse("result row without `total_subjects`".to_string())
            })?;
            Ok((dataset, total))
        })
        .collect()
}

/// Groups cohort query rows per dataset.
///
/// Datasets come out sorted by IRI. In [`ResultMode::Aggregate`] subject data
/// is replaced by the `"protected"` marker.
///
/// # Errors
///
/// Fails when a row lacks `dataset_uuid` or `sub_id`, or carries a
/// non-numeric age or session count.
pub fn shape(
    solutions: &QuerySolutions,
    sizes: &BTreeMap<String, u64>,
    mode: ResultMode,
) -> Result<Vec<CohortQueryResponse>, GraphError> {
    let mut datasets: BTreeMap<String, DatasetAcc> = BTreeMap::new();

    for row in &solutions.results.bindings {
        let dataset_uuid = required(row, "dataset_uuid")?;
        let sub_id = required(row, "sub_id")?;
        let subject = value(row, "subject").unwrap_or(sub_id);
        let dataset = datasets.entry(dataset_uuid.to_string()).or_default();

        dataset.name = dataset.name.take().or_else(|| owned(row, "dataset_name"));
        dataset.portal_uri = dataset
            .portal_uri
            .take()
            .or_else(|| owned(row, "dataset_portal_uri"));
        dataset.subjects.insert(subject.to_string());
        if let Some(modal) = value(row, "image_modal") {
            dataset.image_modals.insert(modal.to_string());
        }

        if mode.is_aggregate() {
            continue;
        }

        let session = dataset
            .sessions
            .entry((subject.to_string(), owned(row, "session_id")))
            .or_insert_with(|| SessionAcc {
                sub_id: sub_id.to_string(),
                ..SessionAcc::default()
            });
        session.session_type = session.session_type.take().or_else(|| owned(row, "session_type"));
        session.session_file_path = session
            .session_file_path
            .take()
            .or_else(|| owned(row, "session_file_path"));
        if session.age.is_none() {
            session.age = number(row, "age")?;
        }
        session.sex = session.sex.take().or_else(|| owned(row, "sex"));
        session.subject_group = session
            .subject_group
            .take()
            .or_else(|| owned(row, "subject_group"));
        if session.num_matching_phenotypic_sessions.is_none() {
            session.num_matching_phenotypic_sessions =
                number(row, "num_matching_phenotypic_sessions")?;
        }
        if session.num_matching_imaging_sessions.is_none() {
            session.num_matching_imaging_sessions = number(row, "num_matching_imaging_sessions")?;
        }
        session.diagnosis.extend(owned(row, "diagnosis"));
        session.assessment.extend(owned(row, "assessment"));
        session.image_modal.extend(owned(row, "image_modal"));
    }

    Ok(datasets
        .into_iter()
        .map(|(dataset_uuid, acc)| {
            let subject_data = if mode.is_aggregate() {
                SubjectData::Protected(Protected::Protected)
            } else {
                SubjectData::Records(
                    acc.sessions
                        .into_iter()
                        .map(|((_, session_id), session)| SessionRecord {
                            sub_id: session.sub_id,
                            session_id,
                            session_type: session.session_type,
                            session_file_path: session.session_file_path,
                            age: session.age,
                            sex: session.sex,
                            diagnosis: session.diagnosis.into_iter().collect(),
                            subject_group: session.subject_group,
                            assessment: session.assessment.into_iter().collect(),
                            image_modal: session.image_modal.into_iter().collect(),
                            num_matching_phenotypic_sessions: session
                                .num_matching_phenotypic_sessions,
                            num_matching_imaging_sessions: session.num_matching_imaging_sessions,
                        })
                        .collect(),
                )
            };
            CohortQueryResponse {
                dataset_total_subjects: sizes.get(&dataset_uuid).copied(),
                dataset_uuid,
                dataset_name: acc.name,
                dataset_portal_uri: acc.portal_uri,
                records_protected: mode.is_aggregate(),
                num_matching_subjects: acc.subjects.len(),
                subject_data,
                image_modals: acc.image_modals.into_iter().collect(),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use insta::assert_json_snapshot;

    use super::*;
    use crate::graph::RdfTerm;

    const DS1: &str = "http://neurobagel.org/vocab/ds1234";
    const DS2: &str = "http://neurobagel.org/vocab/ds2345";
    const T1: &str = "http://purl.org/nidash/nidm#T1Weighted";
    const FLOW: &str = "http://purl.org/nidash/nidm#FlowWeighted";

    fn row(dataset: &str, sub_id: &str, session: &str, modal: Option<&str>) -> Vec<(&'static str, RdfTerm)> {
        let mut row = vec![
            ("dataset_uuid", RdfTerm::uri(dataset)),
            ("dataset_name", RdfTerm::literal(format!("name of {}", &dataset[dataset.len() - 6..]))),
            ("sub_id", RdfTerm::literal(sub_id)),
            ("session_id", RdfTerm::literal(session)),
            ("session_type", RdfTerm::uri("http://neurobagel.org/vocab/ImagingSession")),
            (
                "age",
                RdfTerm::typed_literal("42.5", "http://www.w3.org/2001/XMLSchema#decimal"),
            ),
        ];
        if let Some(modal) = modal {
            row.push(("image_modal", RdfTerm::uri(modal)));
        }
        row
    }

    fn fixture() -> QuerySolutions {
        QuerySolutions::from_rows(
            &["dataset_uuid", "dataset_name", "sub_id", "session_id", "age", "image_modal"],
            vec![
                row(DS2, "sub-01", "ses-01", Some(T1)),
                row(DS1, "sub-01", "ses-01", Some(T1)),
                row(DS1, "sub-01", "ses-01", Some(FLOW)),
                row(DS1, "sub-02", "ses-01", None),
            ],
        )
    }

    #[test]
    fn aggregate_mode_groups_per_dataset() {
        let sizes = BTreeMap::from([(DS1.to_string(), 70), (DS2.to_string(), 40)]);
        let shaped = shape(&fixture(), &sizes, ResultMode::Aggregate).expect("shapes");

        assert_eq!(shaped.len(), 2);
        assert_eq!(shaped[0].dataset_uuid, DS1);
        assert_eq!(shaped[0].num_matching_subjects, 2);
        assert_eq!(shaped[0].dataset_total_subjects, Some(70));
        assert_eq!(shaped[0].image_modals, vec![FLOW.to_string(), T1.to_string()]);
        assert!(shaped[0].records_protected);
        assert_eq!(
            serde_json::to_value(&shaped[0].subject_data).expect("serializes"),
            serde_json::json!("protected")
        );
        assert_eq!(shaped[1].num_matching_subjects, 1);
    }

    #[test]
    fn detail_mode_merges_rows_of_one_session() {
        let shaped = shape(&fixture(), &BTreeMap::new(), ResultMode::Detail).expect("shapes");
        let SubjectData::Records(records) = &shaped[0].subject_data else {
            panic!("expected session records");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].image_modal, vec![FLOW.to_string(), T1.to_string()]);
        assert!(records[1].image_modal.is_empty());
        assert_eq!(records[0].age, Some(42.5));
        assert!(!shaped[0].records_protected);
        assert_eq!(shaped[0].dataset_total_subjects, None);
    }

    #[test]
    fn subjects_sharing_a_label_are_counted_apart() {
        let subject = |iri: &str| {
            let mut row = row(DS1, "sub-01", "ses-01", Some(T1));
            row.push(("subject", RdfTerm::uri(iri)));
            row
        };
        let solutions = QuerySolutions::from_rows(
            &["dataset_uuid", "subject", "sub_id", "session_id"],
            vec![
                subject("http://neurobagel.org/graph/ds1234/sub-01-a"),
                subject("http://neurobagel.org/graph/ds1234/sub-01-b"),
                subject("http://neurobagel.org/graph/ds1234/sub-01-b"),
            ],
        );

        let shaped = shape(&solutions, &BTreeMap::new(), ResultMode::Detail).expect("shapes");

        assert_eq!(shaped[0].num_matching_subjects, 2);
        let SubjectData::Records(records) = &shaped[0].subject_data else {
            panic!("expected session records");
        };
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|record| record.sub_id == "sub-01"));
    }

    #[test]
    fn missing_fields_are_explicit() {
        let solutions = QuerySolutions::from_rows(
            &["dataset_uuid", "sub_id"],
            vec![vec![
                ("dataset_uuid", RdfTerm::uri(DS1)),
                ("sub_id", RdfTerm::literal("sub-01")),
            ]],
        );
        let shaped = shape(&solutions, &BTreeMap::new(), ResultMode::Detail).expect("shapes");
        assert_json_snapshot!(shaped, @r###"
        [
          {
            "dataset_uuid": "http://neurobagel.org/vocab/ds1234",
            "dataset_name": null,
            "dataset_portal_uri": null,
            "dataset_total_subjects": null,
            "records_protected": false,
            "num_matching_subjects": 1,
            "subject_data": [
              {
                "sub_id": "sub-01",
                "session_id": null,
                "session_type": null,
                "session_file_path": null,
                "age": null,
                "sex": null,
                "diagnosis": [],
                "subject_group": null,
                "assessment": [],
                "image_modal": [],
                "num_matching_phenotypic_sessions": null,
                "num_matching_imaging_sessions": null
              }
            ],
            "image_modals": []
          }
        ]
        "###);
    }

    #[test]
    fn rows_without_subject_are_malformed() {
        let solutions = QuerySolutions::from_rows(
            &["dataset_uuid"],
            vec![vec![("dataset_uuid", RdfTerm::uri(DS1))]],
        );
        let err = shape(&solutions, &BTreeMap::new(), ResultMode::Aggregate).expect_err("malformed");
        assert!(matches!(err, GraphError::MalformedResponse(_)));
    }

    #[test]
    fn parses_dataset_sizes() {
        let solutions = QuerySolutions::from_rows(
            &["dataset_uuid", "total_subjects"],
            vec![
                vec![
                    ("dataset_uuid", RdfTerm::uri(DS1)),
                    (
                        "total_subjects",
                        RdfTerm::typed_literal("70", "http://www.w3.org/2001/XMLSchema#integer"),
                    ),
                ],
                vec![
                    ("dataset_uuid", RdfTerm::uri(DS2)),
                    (
                        "total_subjects",
                        RdfTerm::typed_literal("40", "http://www.w3.org/2001/XMLSchema#integer"),
                    ),
                ],
            ],
        );
        assert_eq!(
            dataset_sizes(&solutions).expect("parses"),
            BTreeMap::from([(DS1.to_string(), 70), (DS2.to_string(), 40)])
        );
    }

    #[test]
    fn dataset_iris_are_distinct_and_sorted() {
        let iris = dataset_iris(&fixture()).expect("valid");
        assert_eq!(
            iris.iter().map(Iri::as_str).collect::<Vec<_>>(),
            vec![DS1, DS2]
        );
    }
}
