use crate::error::{CoreError, CoreResult};

/// Where an element's geometry originates from: the host document itself,
/// a linked RVT document, or a DWG/DXF import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceType {
	Host,
	Link,
	Dwg,
}

/// A validated `(source_type, source_id, source_label)` triple identifying
/// where an element came from. This is the only place source semantics are
/// validated; everywhere else treats a `SourceIdentity` as an opaque,
/// already-trusted key. Consumers must not decode `source_id` back into a
/// `source_type` — it is a stable identifier, not an encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceIdentity {
	pub source_type: SourceType,
	pub source_id: String,
	pub source_label: String,
}

impl SourceIdentity {
	/// Builds a validated identity. `source_label` defaults to `source_id`
	/// when `None`. Returns `CoreError::InvalidSourceIdentity` if `source_id`
	/// is empty.
	pub fn new(source_type: SourceType, source_id: impl Into<String>, source_label: Option<String>) -> CoreResult<Self> {
		let source_id = source_id.into();
		if source_id.is_empty() {
			return Err(CoreError::InvalidSourceIdentity("source_id must be a non-empty string".into()));
		}
		let source_label = source_label.unwrap_or_else(|| source_id.clone());
		Ok(Self { source_type, source_id, source_label })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn empty_source_id_is_rejected() {
		let result = SourceIdentity::new(SourceType::Host, "", None);
		assert!(result.is_err());
	}

	#[test]
	fn label_defaults_to_id() {
		let identity = SourceIdentity::new(SourceType::Link, "link-42", None).unwrap();
		assert_eq!(identity.source_label, "link-42");
	}

	#[test]
	fn explicit_label_is_preserved() {
		let identity = SourceIdentity::new(SourceType::Dwg, "dwg-1", Some("Site Plan.dwg".to_string())).unwrap();
		assert_eq!(identity.source_label, "Site Plan.dwg");
	}
}
