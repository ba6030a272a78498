use pdpsync_domain::constants::{
    CDAR_DATETIME_FORMAT, CDAR_NAMESPACE, QDT_NAMESPACE, RAM_NAMESPACE, UDT_NAMESPACE,
};
use pdpsync_domain::{CdarDocument, ReferencedDocument, TradeParty};

/// Encode a CDAR acknowledgement.
///
/// Output decodes back through [`parse_cdar`](super::parse_cdar) to the same
/// model.
pub fn generate_cdar(cdar: &CdarDocument) -> String {
    let exchanged = &cdar.exchanged_document;
    let ack = &cdar.acknowledgement_document;

    let name_xml = exchanged
        .name
        .as_deref()
        .map(|name| format!("\n    <ram:Name>{}</ram:Name>", escape_xml(name)))
        .unwrap_or_default();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rsm:CrossDomainAcknowledgementAndResponse xmlns:rsm="{CDAR_NAMESPACE}"
    xmlns:ram="{RAM_NAMESPACE}"
    xmlns:udt="{UDT_NAMESPACE}"
    xmlns:qdt="{QDT_NAMESPACE}">
  <rsm:ExchangedDocumentContext>
    <ram:GuidelineSpecifiedDocumentContextParameter>
      <ram:ID>{guideline_id}</ram:ID>
    </ram:GuidelineSpecifiedDocumentContextParameter>
  </rsm:ExchangedDocumentContext>
  <rsm:ExchangedDocument>
    <ram:ID>{document_id}</ram:ID>{name_xml}
    <ram:IssueDateTime>
      <udt:DateTimeString format="{CDAR_DATETIME_FORMAT}">{document_issued}</udt:DateTimeString>
    </ram:IssueDateTime>
{sender}
{issuer}
{recipient}
  </rsm:ExchangedDocument>
  <rsm:AcknowledgementDocument>
    <ram:TypeCode>{ack_type_code}</ram:TypeCode>
    <ram:IssueDateTime>
      <udt:DateTimeString format="{CDAR_DATETIME_FORMAT}">{ack_issued}</udt:DateTimeString>
    </ram:IssueDateTime>
{referenced}
  </rsm:AcknowledgementDocument>
</rsm:CrossDomainAcknowledgementAndResponse>
"#,
        guideline_id = escape_xml(&cdar.guideline_id),
        document_id = escape_xml(&exchanged.id),
        document_issued = escape_xml(&exchanged.issue_date_time),
        sender = party_xml("SenderTradeParty", &exchanged.sender, "    "),
        issuer = party_xml("IssuerTradeParty", &exchanged.issuer, "    "),
        recipient = party_xml("RecipientTradeParty", &exchanged.recipient, "    "),
        ack_type_code = escape_xml(&ack.type_code),
        ack_issued = escape_xml(&ack.issue_date_time),
        referenced = referenced_xml(&ack.referenced_document),
    )
}

fn referenced_xml(doc: &ReferencedDocument) -> String {
    let mut status = String::new();
    if let Some(code) = &doc.status_reason_code {
        status.push_str(&format!("\n        <ram:ReasonCode>{}</ram:ReasonCode>", escape_xml(code)));
    }
    if let Some(reason) = &doc.status_reason {
        status.push_str(&format!("\n        <ram:Reason>{}</ram:Reason>", escape_xml(reason)));
    }
    if let Some(sequence) = doc.status_sequence_numeric {
        status.push_str(&format!("\n        <ram:SequenceNumeric>{sequence}</ram:SequenceNumeric>"));
    }
    if let Some(note) = &doc.status_included_note_content {
        status.push_str(&format!(
            "\n        <ram:IncludedNote>\n          <ram:Content>{}</ram:Content>\n        </ram:IncludedNote>",
            escape_xml(note)
        ));
    }
    let status_xml = if status.is_empty() {
        String::new()
    } else {
        format!("\n      <ram:SpecifiedDocumentStatus>{status}\n      </ram:SpecifiedDocumentStatus>")
    };

    format!(
        r#"    <ram:ReferenceReferencedDocument>
      <ram:IssuerAssignedID>{issuer_assigned_id}</ram:IssuerAssignedID>
      <ram:StatusCode>{status_code}</ram:StatusCode>
      <ram:TypeCode>{type_code}</ram:TypeCode>
      <ram:ProcessConditionCode>{process_condition_code}</ram:ProcessConditionCode>
      <ram:ProcessCondition>{process_condition}</ram:ProcessCondition>
{issuer}{status_xml}
    </ram:ReferenceReferencedDocument>"#,
        issuer_assigned_id = escape_xml(&doc.issuer_assigned_id),
        status_code = escape_xml(&doc.status_code),
        type_code = escape_xml(&doc.type_code),
        process_condition_code = doc.process_condition_code.code(),
        process_condition = escape_xml(&doc.process_condition),
        issuer = party_xml("IssuerTradeParty", &doc.issuer_trade_party, "      "),
    )
}

fn party_xml(tag: &str, party: &TradeParty, indent: &str) -> String {
    let global_id = match &party.scheme_id {
        Some(scheme) => format!(
            r#"<ram:GlobalID schemeID="{}">{}</ram:GlobalID>"#,
            escape_xml(scheme),
            escape_xml(&party.global_id)
        ),
        None => format!("<ram:GlobalID>{}</ram:GlobalID>", escape_xml(&party.global_id)),
    };

    let mut xml = format!("{indent}<ram:{tag}>\n{indent}  {global_id}");
    if let Some(name) = &party.name {
        xml.push_str(&format!("\n{indent}  <ram:Name>{}</ram:Name>", escape_xml(name)));
    }
    if let Some(role) = &party.role_code {
        xml.push_str(&format!("\n{indent}  <ram:RoleCode>{}</ram:RoleCode>", escape_xml(role)));
    }
    xml.push_str(&format!("\n{indent}</ram:{tag}>"));
    xml
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
