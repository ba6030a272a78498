use std::collections::HashMap;

use pdpsync_domain::{
    AcknowledgementDocument, CdarDocument, ExchangedDocument, LifecycleCode, ReferencedDocument,
    TradeParty,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::paths::{self, PartyPaths};
use super::CdarError;

/// Decode a CDAR acknowledgement.
///
/// Every mandatory node is checked before failing, so the error lists all
/// missing fields at once. `ProcessConditionCode` must be present and within
/// 200..=213; it is never defaulted.
pub fn parse_cdar(xml: &[u8]) -> Result<CdarDocument, CdarError> {
    let text = std::str::from_utf8(xml).map_err(|e| CdarError::Malformed(e.to_string()))?;
    let values = collect_values(text.trim_start_matches('\u{feff}'))?;
    Fields { values, missing: Vec::new() }.into_document()
}

/// Flatten the document into `local/name/path -> text`, attributes under
/// `path@attr`. The first occurrence of a path wins.
fn collect_values(xml: &str) -> Result<HashMap<String, String>, CdarError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut values = HashMap::new();
    let mut stack: Vec<String> = Vec::new();
    let mut root_seen = false;
    let mut root_closed = false;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let name = local_name(&element);
                if !root_seen {
                    if name != paths::ROOT {
                        return Err(CdarError::UnexpectedRoot(name));
                    }
                    root_seen = true;
                    continue;
                }
                stack.push(name);
                record_attributes(&element, &stack.join("/"), &mut values)?;
            }
            Event::Empty(element) => {
                if !root_seen {
                    let name = local_name(&element);
                    return Err(if name == paths::ROOT {
                        CdarError::Malformed("empty acknowledgement document".to_string())
                    } else {
                        CdarError::UnexpectedRoot(name)
                    });
                }
                let path = format!("{}/{}", stack.join("/"), local_name(&element));
                record_attributes(&element, path.trim_start_matches('/'), &mut values)?;
            }
            Event::Text(text) if !stack.is_empty() => {
                let value = text.unescape()?;
                values.entry(stack.join("/")).or_insert_with(|| value.into_owned());
            }
            Event::CData(data) if !stack.is_empty() => {
                let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                values.entry(stack.join("/")).or_insert(value);
            }
            Event::End(_) => {
                if stack.pop().is_none() {
                    root_closed = true;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err(CdarError::Malformed("document has no root element".to_string()));
    }
    if !root_closed {
        return Err(CdarError::Malformed("unexpected end of document".to_string()));
    }
    Ok(values)
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn record_attributes(
    element: &BytesStart<'_>,
    path: &str,
    values: &mut HashMap<String, String>,
) -> Result<(), CdarError> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| CdarError::Malformed(e.to_string()))?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = format!(
            "{path}@{}",
            String::from_utf8_lossy(attribute.key.local_name().as_ref())
        );
        let value = attribute.unescape_value()?.into_owned();
        values.entry(key).or_insert(value);
    }
    Ok(())
}

struct Fields {
    values: HashMap<String, String>,
    missing: Vec<&'static str>,
}

impl Fields {
    fn required(&mut self, path: &'static str) -> String {
        match self.optional(path) {
            Some(value) => value,
            None => {
                self.missing.push(path);
                String::new()
            }
        }
    }

    fn optional(&self, path: &str) -> Option<String> {
        self.values.get(path).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn party(&mut self, paths: &PartyPaths) -> TradeParty {
        TradeParty {
            global_id: self.required(paths.global_id),
            scheme_id: self.optional(paths.scheme_id),
            name: self.optional(paths.name),
            role_code: self.optional(paths.role_code),
        }
    }

    fn into_document(mut self) -> Result<CdarDocument, CdarError> {
        let guideline_id = self.required(paths::GUIDELINE_ID);

        let exchanged_document = ExchangedDocument {
            id: self.required(paths::DOCUMENT_ID),
            name: self.optional(paths::DOCUMENT_NAME),
            issue_date_time: self.required(paths::DOCUMENT_ISSUED),
            sender: self.party(&paths::SENDER),
            issuer: self.party(&paths::ISSUER),
            recipient: self.party(&paths::RECIPIENT),
        };

        let type_code = self.required(paths::ACK_TYPE_CODE);
        let issue_date_time = self.required(paths::ACK_ISSUED);
        let issuer_assigned_id = self.required(paths::REF_ISSUER_ASSIGNED_ID);
        let status_code = self.required(paths::REF_STATUS_CODE);
        let ref_type_code = self.required(paths::REF_TYPE_CODE);
        let raw_condition_code = self.required(paths::REF_PROCESS_CONDITION_CODE);
        let process_condition = self.required(paths::REF_PROCESS_CONDITION);
        let issuer_trade_party = self.party(&paths::REF_ISSUER);

        if !self.missing.is_empty() {
            return Err(CdarError::MissingFields(self.missing));
        }

        let process_condition_code = raw_condition_code
            .parse::<u16>()
            .ok()
            .and_then(|code| LifecycleCode::try_from(code).ok())
            .ok_or_else(|| CdarError::InvalidField {
                field: paths::REF_PROCESS_CONDITION_CODE,
                value: raw_condition_code.clone(),
            })?;

        let status_sequence_numeric = self
            .optional(paths::REF_SEQUENCE)
            .map(|raw| {
                raw.parse::<u32>()
                    .map_err(|_| CdarError::InvalidField { field: paths::REF_SEQUENCE, value: raw })
            })
            .transpose()?;

        Ok(CdarDocument {
            guideline_id,
            exchanged_document,
            acknowledgement_document: AcknowledgementDocument {
                type_code,
                issue_date_time,
                referenced_document: ReferencedDocument {
                    issuer_assigned_id,
                    status_code,
                    type_code: ref_type_code,
                    process_condition_code,
                    process_condition,
                    issuer_trade_party,
                    status_reason_code: self.optional(paths::REF_REASON_CODE),
                    status_reason: self.optional(paths::REF_REASON),
                    status_sequence_numeric,
                    status_included_note_content: self.optional(paths::REF_NOTE),
                },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFUSED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rsm:CrossDomainAcknowledgementAndResponse
    xmlns:rsm="urn:un:unece:uncefact:data:standard:CrossDomainAcknowledgementAndResponse:100"
    xmlns:ram="urn:un:unece:uncefact:data:standard:ReusableAggregateBusinessInformationEntity:100"
    xmlns:udt="urn:un:unece:uncefact:data:standard:UnqualifiedDataType:100">
  <rsm:ExchangedDocumentContext>
    <ram:GuidelineSpecifiedDocumentContextParameter>
      <ram:ID>urn.cpro.gouv.fr:1p0:CDV:invoice</ram:ID>
    </ram:GuidelineSpecifiedDocumentContextParameter>
  </rsm:ExchangedDocumentContext>
  <rsm:ExchangedDocument>
    <ram:ID>CDV-0001</ram:ID>
    <ram:Name>Statut facture</ram:Name>
    <ram:IssueDateTime><udt:DateTimeString format="204">20250301101500</udt:DateTimeString></ram:IssueDateTime>
    <ram:SenderTradeParty><ram:GlobalID schemeID="0238">PDP01</ram:GlobalID><ram:RoleCode>WK</ram:RoleCode></ram:SenderTradeParty>
    <ram:IssuerTradeParty><ram:GlobalID schemeID="0225">123456789</ram:GlobalID><ram:Name>Buyer SA</ram:Name></ram:IssuerTradeParty>
    <ram:RecipientTradeParty><ram:GlobalID schemeID="0225">987654321</ram:GlobalID></ram:RecipientTradeParty>
  </rsm:ExchangedDocument>
  <rsm:AcknowledgementDocument>
    <ram:TypeCode>23</ram:TypeCode>
    <ram:IssueDateTime><udt:DateTimeString format="204">20250301101500</udt:DateTimeString></ram:IssueDateTime>
    <ram:ReferenceReferencedDocument>
      <ram:IssuerAssignedID>F2025-0042</ram:IssuerAssignedID>
      <ram:StatusCode>10</ram:StatusCode>
      <ram:TypeCode>380</ram:TypeCode>
      <ram:ProcessConditionCode>210</ram:ProcessConditionCode>
      <ram:ProcessCondition>Refusée</ram:ProcessCondition>
      <ram:IssuerTradeParty><ram:GlobalID schemeID="0225">123456789</ram:GlobalID></ram:IssuerTradeParty>
      <ram:SpecifiedDocumentStatus>
        <ram:ReasonCode>DOUBLON</ram:ReasonCode>
        <ram:Reason>Facture en double &amp; déjà reçue</ram:Reason>
        <ram:SequenceNumeric>1</ram:SequenceNumeric>
        <ram:IncludedNote><ram:Content>Voir F2025-0041</ram:Content></ram:IncludedNote>
      </ram:SpecifiedDocumentStatus>
    </ram:ReferenceReferencedDocument>
  </rsm:AcknowledgementDocument>
</rsm:CrossDomainAcknowledgementAndResponse>"#;

    #[test]
    fn decodes_refusal() {
        let cdar = parse_cdar(REFUSED.as_bytes()).unwrap();
        let referenced = cdar.referenced();

        assert_eq!(cdar.guideline_id, "urn.cpro.gouv.fr:1p0:CDV:invoice");
        assert_eq!(referenced.issuer_assigned_id, "F2025-0042");
        assert_eq!(referenced.process_condition_code, LifecycleCode::Refused);
        assert_eq!(referenced.status_reason.as_deref(), Some("Facture en double & déjà reçue"));
        assert_eq!(referenced.status_sequence_numeric, Some(1));
        assert_eq!(referenced.status_included_note_content.as_deref(), Some("Voir F2025-0041"));
        assert_eq!(cdar.exchanged_document.sender.scheme_id.as_deref(), Some("0238"));
        assert_eq!(cdar.exchanged_document.issuer.name.as_deref(), Some("Buyer SA"));
        assert_eq!(cdar.exchanged_document.issue_date_time, "20250301101500");
    }

    #[test]
    fn reports_every_missing_field_at_once() {
        let stripped = REFUSED
            .replace("<ram:ProcessConditionCode>210</ram:ProcessConditionCode>", "")
            .replace("<ram:IssuerAssignedID>F2025-0042</ram:IssuerAssignedID>", "");

        let err = parse_cdar(stripped.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            CdarError::MissingFields(vec![
                paths::REF_ISSUER_ASSIGNED_ID,
                paths::REF_PROCESS_CONDITION_CODE,
            ])
        );
    }

    #[test]
    fn rejects_code_outside_lifecycle_range() {
        let invalid = REFUSED.replace(">210<", ">299<");
        let err = parse_cdar(invalid.as_bytes()).unwrap_err();
        assert!(matches!(err, CdarError::InvalidField { value, .. } if value == "299"));
    }

    #[test]
    fn rejects_other_documents() {
        let err = parse_cdar(b"<Invoice><ID>1</ID></Invoice>").unwrap_err();
        assert_eq!(err, CdarError::UnexpectedRoot("Invoice".into()));
        assert!(parse_cdar(b"<rsm:CrossDomainAcknowledgementAndResponse><a>").is_err());
    }
}
