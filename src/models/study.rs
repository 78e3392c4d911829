//! Classified study documents and the pairing policy applied to them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The document types this tool cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Protocol,
    Icf,
}

impl DocumentKind {
    /// Returns the display name of the document type
    pub fn name(&self) -> &'static str {
        match self {
            DocumentKind::Protocol => "Protocol",
            DocumentKind::Icf => "ICF",
        }
    }

    /// Prefix used for downloaded file names
    pub fn file_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Protocol => "protocol",
            DocumentKind::Icf => "icf",
        }
    }

    /// Long label the registry uses for this type (matched case-insensitively)
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Protocol => "Study Protocol",
            DocumentKind::Icf => "Informed Consent Form",
        }
    }

    /// Token this type contributes to a `typeAbbrev` such as `Prot_SAP_ICF`
    pub fn abbrev(&self) -> &'static str {
        match self {
            DocumentKind::Protocol => "Prot",
            DocumentKind::Icf => "ICF",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A downloadable document belonging to one study
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub kind: DocumentKind,

    /// File name as uploaded to the registry
    pub filename: String,

    /// Size in bytes, when the registry reports it
    pub size: Option<u64>,

    /// Source URL
    pub url: String,

    /// Raw type tag from the registry (e.g. `Prot_SAP`)
    pub type_abbrev: String,
}

/// The protocol/ICF documents found for one study
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyDocuments {
    pub nct_id: String,
    pub brief_title: String,

    /// Number of entries in the study's document section, of any type
    pub listed_documents: usize,

    pub protocol: Option<DocumentInfo>,
    pub icf: Option<DocumentInfo>,
}

impl StudyDocuments {
    /// Create an empty classification for a study
    pub fn new(nct_id: impl Into<String>, brief_title: impl Into<String>) -> Self {
        Self {
            nct_id: nct_id.into(),
            brief_title: brief_title.into(),
            listed_documents: 0,
            protocol: None,
            icf: None,
        }
    }

    /// Both a protocol and an ICF are present
    pub fn has_both(&self) -> bool {
        self.protocol.is_some() && self.icf.is_some()
    }

    /// A protocol is present, regardless of ICF
    pub fn has_protocol(&self) -> bool {
        self.protocol.is_some()
    }

    /// The study lists at least one document of any type
    pub fn has_any_document(&self) -> bool {
        self.listed_documents > 0 || self.protocol.is_some() || self.icf.is_some()
    }

    /// Document of the given type, if present
    pub fn document(&self, kind: DocumentKind) -> Option<&DocumentInfo> {
        match kind {
            DocumentKind::Protocol => self.protocol.as_ref(),
            DocumentKind::Icf => self.icf.as_ref(),
        }
    }
}

/// Which documents a study needs to count as a match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingRequirement {
    /// Protocol and ICF must both be present
    #[default]
    ProtocolAndIcf,
    /// Protocol must be present; ICF is optional
    ProtocolOnly,
}

impl PairingRequirement {
    /// Build from the `--no-icf` switch
    pub fn from_require_icf(require_icf: bool) -> Self {
        if require_icf {
            PairingRequirement::ProtocolAndIcf
        } else {
            PairingRequirement::ProtocolOnly
        }
    }

    pub fn requires_icf(&self) -> bool {
        matches!(self, PairingRequirement::ProtocolAndIcf)
    }

    pub fn is_satisfied_by(&self, study: &StudyDocuments) -> bool {
        match self {
            PairingRequirement::ProtocolAndIcf => study.has_both(),
            PairingRequirement::ProtocolOnly => study.has_protocol(),
        }
    }

    /// Human-readable description, as used in the summary
    pub fn describe(&self) -> &'static str {
        match self {
            PairingRequirement::ProtocolAndIcf => "Protocol + ICF",
            PairingRequirement::ProtocolOnly => "Protocol documents",
        }
    }
}
