//! Typed view of a study record as returned by the ClinicalTrials.gov v2 API.
//!
//! Every field is optional and unknown fields are ignored, so a sparse or
//! partially populated record still deserializes. Nothing outside
//! [`crate::classifier`] should need to look inside these types.

use serde::{Deserialize, Serialize};

/// One entry of the `studies` array
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_section: Option<ProtocolSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_section: Option<DocumentSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification_module: Option<IdentificationModule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationModule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nct_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief_title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_document_module: Option<LargeDocumentModule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LargeDocumentModule {
    #[serde(default)]
    pub large_docs: Vec<LargeDoc>,
}

/// A single uploaded document (`largeDocs[]`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LargeDoc {
    /// Short type tag, e.g. `Prot`, `ICF`, `Prot_SAP`, `Prot_SAP_ICF`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_abbrev: Option<String>,

    /// Long type label, e.g. `Study Protocol and Statistical Analysis Plan`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default)]
    pub has_protocol: bool,

    #[serde(default)]
    pub has_sap: bool,

    #[serde(default)]
    pub has_icf: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl StudyRecord {
    /// NCT identifier, if the record carries one
    pub fn nct_id(&self) -> Option<&str> {
        self.identification().and_then(|m| m.nct_id.as_deref())
    }

    /// Brief title, if the record carries one
    pub fn brief_title(&self) -> Option<&str> {
        self.identification().and_then(|m| m.brief_title.as_deref())
    }

    /// Documents listed in the document section (empty when the section is missing)
    pub fn large_docs(&self) -> &[LargeDoc] {
        self.document_section
            .as_ref()
            .and_then(|s| s.large_document_module.as_ref())
            .map(|m| m.large_docs.as_slice())
            .unwrap_or(&[])
    }

    fn identification(&self) -> Option<&IdentificationModule> {
        self.protocol_section
            .as_ref()
            .and_then(|p| p.identification_module.as_ref())
    }
}
