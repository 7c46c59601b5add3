//! `GET /docs`: static description of the public endpoints.

use axum::{response::Response, routing::get};
use serde::Serialize;

use super::{format, routes::Routes};
use crate::Result;

#[derive(Debug, Serialize)]
pub struct ApiDocs {
    pub title: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<EndpointDoc>,
}

#[derive(Debug, Serialize)]
pub struct EndpointDoc {
    pub path: &'static str,
    pub method: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamDoc>,
}

#[derive(Debug, Serialize)]
pub struct ParamDoc {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

const fn optional(name: &'static str, description: &'static str) -> ParamDoc {
    ParamDoc {
        name,
        required: false,
        description,
    }
}

const fn required(name: &'static str, description: &'static str) -> ParamDoc {
    ParamDoc {
        name,
        required: true,
        description,
    }
}

#[must_use]
pub fn api_docs() -> ApiDocs {
    ApiDocs {
        title: "Neurobagel API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            EndpointDoc {
                path: "/query",
                method: "GET",
                description: "Datasets with subjects matching all given criteria",
                params: vec![
                    optional("min_age", "Minimum subject age, a non-negative number"),
                    optional("max_age", "Maximum subject age, not below min_age"),
                    optional(
                        "sex",
                        "snomed:248153007 (male), snomed:248152002 (female) or snomed:32570681000036106 (other)",
                    ),
                    optional("diagnosis", "Diagnosis term, e.g. snomed:35489007"),
                    optional(
                        "is_control",
                        "true for healthy controls only; cannot be combined with diagnosis",
                    ),
                    optional(
                        "min_num_phenotypic_sessions",
                        "Minimum number of phenotypic sessions",
                    ),
                    optional("min_num_imaging_sessions", "Minimum number of imaging sessions"),
                    optional(
                        "assessment",
                        "Assessment term (nb:, cogatlas: or snomed:), e.g. cogatlas:tsk_U9gDp8utahAfO",
                    ),
                    optional(
                        "image_modal",
                        "Imaging modality term (nidm:, nb: or snomed:), e.g. nidm:T1Weighted",
                    ),
                ],
            },
            EndpointDoc {
                path: "/attributes",
                method: "GET",
                description: "Controlled-term attributes present in the graph",
                params: vec![],
            },
            EndpointDoc {
                path: "/attributes/{data_element_uri}",
                method: "GET",
                description: "Terms used for an attribute, with labels where known",
                params: vec![required(
                    "data_element_uri",
                    "Prefixed attribute, e.g. nb:Assessment",
                )],
            },
            EndpointDoc {
                path: "/attributes/{data_element_uri}/vocab",
                method: "GET",
                description: "Vocabulary and term labels backing an attribute",
                params: vec![required(
                    "data_element_uri",
                    "Prefixed attribute, e.g. nb:Diagnosis",
                )],
            },
            EndpointDoc {
                path: "/_readiness",
                method: "GET",
                description: "Whether the graph store answers",
                params: vec![],
            },
        ],
    }
}

/// Serves [`api_docs`].
///
/// # Errors
///
/// Currently this function doesn't return any error.
pub async fn index() -> Result<Response> {
    format::json(api_docs())
}

pub fn routes() -> Routes {
    Routes::new().add("/docs", get(index))
}
