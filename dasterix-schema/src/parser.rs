use crate::xml_model::CategoryXml;

/// Parses the given XML string into a [`CategoryXml`] document.
///
/// # Arguments
/// * `xml` - A string slice that holds the XML data.
///
/// # Returns
/// * `Result<CategoryXml, quick_xml::DeError>` - The parsed category
///   document or an error if parsing fails.
pub fn parse_category(xml: &str) -> Result<CategoryXml, quick_xml::DeError> {
    quick_xml::de::from_str(xml)
}
