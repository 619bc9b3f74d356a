//! pixx.io filter-expression grammar.
//!
//! Search requests carry a single `filter` query parameter holding a JSON-encoded expression.
//! Several criteria are combined with a `connectorAnd` node; a lone criterion is sent unwrapped.

use crate::model::AssetId;
use serde::Serialize;

/// One node of the DAM filter grammar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "filterType", rename_all = "camelCase")]
pub enum Filter {
    #[serde(rename_all = "camelCase")]
    SearchTerm {
        term: String,
        exact_match: bool,
        use_synonyms: bool,
    },
    #[serde(rename_all = "camelCase")]
    FileType { file_type: String },
    #[serde(rename_all = "camelCase")]
    FileExtension { file_extension: String },
    Directory {
        #[serde(rename = "directoryID")]
        directory_id: AssetId,
        #[serde(rename = "includeSubdirectories")]
        include_subdirectories: bool,
    },
    Collection {
        #[serde(rename = "collectionID")]
        collection_id: AssetId,
    },
    /// Logical AND over at least two children, in construction order.
    ConnectorAnd { filters: Vec<Filter> },
}

/// Search criteria as they arrive from tool parameters.
#[derive(Debug, Clone, Default)]
pub struct FilterInputs {
    pub query: Option<String>,
    pub exact_match: bool,
    pub use_synonyms: bool,
    pub file_type: Option<String>,
    pub file_extension: Option<String>,
    pub directory_id: Option<AssetId>,
    pub include_subdirectories: bool,
    pub collection_id: Option<AssetId>,
}

impl FilterInputs {
    /// Build the filter expression, or `None` when no criterion was supplied.
    ///
    /// Order is fixed: search term, file type, extension, directory, collection.
    #[must_use]
    pub fn build(&self) -> Option<Filter> {
        let mut filters = Vec::new();

        if let Some(term) = non_blank(self.query.as_deref()) {
            filters.push(Filter::SearchTerm {
                term: term.to_string(),
                exact_match: self.exact_match,
                use_synonyms: self.use_synonyms,
            });
        }
        if let Some(file_type) = non_blank(self.file_type.as_deref()) {
            filters.push(Filter::FileType {
                file_type: file_type.to_string(),
            });
        }
        if let Some(ext) = non_blank(self.file_extension.as_deref()) {
            filters.push(Filter::FileExtension {
                file_extension: ext.trim_start_matches('.').to_ascii_lowercase(),
            });
        }
        // Id 0 never addresses a real directory/collection; treat it as "not provided".
        if let Some(id) = self.directory_id.as_ref().filter(|id| !id.is_unset()) {
            filters.push(Filter::Directory {
                directory_id: id.clone(),
                include_subdirectories: self.include_subdirectories,
            });
        }
        if let Some(id) = self.collection_id.as_ref().filter(|id| !id.is_unset()) {
            filters.push(Filter::Collection {
                collection_id: id.clone(),
            });
        }

        match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(Filter::ConnectorAnd { filters }),
        }
    }

    /// The serialized `filter` query parameter value, if any criterion was supplied.
    #[must_use]
    pub fn to_query_value(&self) -> Option<String> {
        self.build().map(|f| f.to_json_string())
    }
}

impl Filter {
    #[must_use]
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn as_json(f: &Filter) -> Value {
        serde_json::from_str(&f.to_json_string()).expect("filter json")
    }

    #[test]
    fn no_inputs_omit_the_filter() {
        assert_eq!(FilterInputs::default().build(), None);
        let blank = FilterInputs {
            query: Some("   ".to_string()),
            ..FilterInputs::default()
        };
        assert_eq!(blank.to_query_value(), None);
    }

    #[test]
    fn query_only_is_sent_unwrapped() {
        let inputs = FilterInputs {
            query: Some("logo".to_string()),
            use_synonyms: true,
            ..FilterInputs::default()
        };
        let filter = inputs.build().expect("filter");
        assert_eq!(
            as_json(&filter),
            json!({
                "filterType": "searchTerm",
                "term": "logo",
                "exactMatch": false,
                "useSynonyms": true
            })
        );
    }

    #[test]
    fn query_and_extension_are_joined_in_order() {
        let inputs = FilterInputs {
            query: Some("logo".to_string()),
            file_extension: Some(".PNG".to_string()),
            ..FilterInputs::default()
        };
        let v = as_json(&inputs.build().expect("filter"));
        assert_eq!(v["filterType"], "connectorAnd");
        let children = v["filters"].as_array().expect("children");
        assert_eq!(children.len(), 2);
        assert_eq!(children[0]["filterType"], "searchTerm");
        assert_eq!(children[1]["filterType"], "fileExtension");
        assert_eq!(children[1]["fileExtension"], "png");
    }

    #[test]
    fn all_criteria_follow_fixed_order() {
        let inputs = FilterInputs {
            query: Some("team".to_string()),
            file_type: Some("image".to_string()),
            file_extension: Some("jpg".to_string()),
            directory_id: Some(AssetId::Int(7)),
            include_subdirectories: true,
            collection_id: Some(AssetId::Str("c-9".to_string())),
            ..FilterInputs::default()
        };
        let v = as_json(&inputs.build().expect("filter"));
        let kinds: Vec<&str> = v["filters"]
            .as_array()
            .expect("children")
            .iter()
            .filter_map(|c| c["filterType"].as_str())
            .collect();
        assert_eq!(
            kinds,
            vec!["searchTerm", "fileType", "fileExtension", "directory", "collection"]
        );
        assert_eq!(v["filters"][3]["directoryID"], 7);
        assert_eq!(v["filters"][3]["includeSubdirectories"], true);
        assert_eq!(v["filters"][4]["collectionID"], "c-9");
    }

    #[test]
    fn zero_ids_are_treated_as_absent() {
        let inputs = FilterInputs {
            directory_id: Some(AssetId::Int(0)),
            collection_id: Some(AssetId::Str("0".to_string())),
            ..FilterInputs::default()
        };
        assert_eq!(inputs.build(), None);

        let with_type = FilterInputs {
            file_type: Some("video".to_string()),
            directory_id: Some(AssetId::Int(0)),
            ..FilterInputs::default()
        };
        assert_eq!(
            with_type.build(),
            Some(Filter::FileType {
                file_type: "video".to_string()
            })
        );
    }
}
