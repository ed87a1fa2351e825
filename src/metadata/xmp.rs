//! A minimal XMP decoder.
//!
//! XMP packets are RDF/XML. Rather than parsing the XML, a fixed set of well-known properties is
//! searched for, both in element form (`<dc:title>...</dc:title>`, possibly wrapping an RDF
//! container whose first `rdf:li` item is used) and in attribute form (`xmp:CreatorTool="..."`).
//!
//! Namespace prefixes are matched literally (`dc:`, `xmp:`, `tiff:`). Packets that bind these
//! namespaces to other prefixes yield no tags.

use crate::tags::{names, TagList};

const PROPERTIES: &[(&str, &str)] = &[
    ("dc:title", names::TITLE),
    ("dc:description", names::DESCRIPTION),
    ("dc:creator", names::ARTIST),
    ("dc:rights", names::COPYRIGHT),
    ("xmp:CreatorTool", names::APPLICATION_NAME),
    ("tiff:Make", names::DEVICE_MANUFACTURER),
    ("tiff:Model", names::DEVICE_MODEL),
];

/// Decodes an XMP packet following the XMP `APP1` signature.
pub fn decode_xmp(data: &[u8]) -> Option<TagList> {
    let packet = std::str::from_utf8(data).ok()?;
    if !packet.contains("rdf:RDF") {
        return None;
    }

    let mut tags = TagList::new();
    for &(property, name) in PROPERTIES {
        let value = element_value(packet, property).or_else(|| attribute_value(packet, property));
        if let Some(value) = value {
            tags.insert(name, value);
        }
    }

    (!tags.is_empty()).then_some(tags)
}

/// Finds `<name ...>` and returns the position right after the start tag, unless it is
/// self-closing.
fn find_start_tag(xml: &str, name: &str) -> Option<usize> {
    let mut from = 0;
    loop {
        let start = from + xml[from..].find(&format!("<{name}"))?;
        let after_name = start + 1 + name.len();
        from = after_name;
        match xml[after_name..].chars().next()? {
            '>' => return Some(after_name + 1),
            c if c.is_whitespace() => {
                let close = after_name + xml[after_name..].find('>')?;
                if xml[..close].ends_with('/') {
                    continue;
                }
                return Some(close + 1);
            }
            // `<dc:titleFoo`, or a self-closing `<dc:title/>`
            _ => continue,
        }
    }
}

fn element_value(xml: &str, name: &str) -> Option<String> {
    let content_start = find_start_tag(xml, name)?;
    let content_len = xml[content_start..].find(&format!("</{name}>"))?;
    let content = &xml[content_start..content_start + content_len];

    let text = if content.contains("<rdf:li") {
        let item_start = find_start_tag(content, "rdf:li")?;
        let item_len = content[item_start..].find("</rdf:li>")?;
        &content[item_start..item_start + item_len]
    } else {
        content
    };

    let text = unescape(text.trim());
    (!text.is_empty()).then_some(text)
}

fn attribute_value(xml: &str, name: &str) -> Option<String> {
    let mut from = 0;
    loop {
        let pos = from + xml[from..].find(name)?;
        from = pos + name.len();

        let preceded_by_space = xml[..pos].ends_with(|c: char| c.is_whitespace());
        let rest = xml[from..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        if !preceded_by_space {
            continue;
        }

        let rest = rest.trim_start();
        let quote = rest.chars().next().filter(|&c| c == '"' || c == '\'')?;
        let value = &rest[1..];
        let end = value.find(quote)?;
        let text = unescape(value[..end].trim());
        return (!text.is_empty()).then_some(text);
    }
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKET: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about=""
    xmlns:xmp="http://ns.adobe.com/xap/1.0/"
    xmlns:tiff="http://ns.adobe.com/tiff/1.0/"
    xmp:CreatorTool="Tool &amp; Co"
    tiff:Model = 'X1'>
   <dc:title>
    <rdf:Alt>
     <rdf:li xml:lang="x-default">Sunset</rdf:li>
    </rdf:Alt>
   </dc:title>
   <dc:description/>
   <dc:rights>Public domain</dc:rights>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

    #[test]
    fn properties() {
        let tags = decode_xmp(PACKET.as_bytes()).unwrap();
        assert_eq!(tags.get_str(names::TITLE), Some("Sunset"));
        assert_eq!(tags.get_str(names::COPYRIGHT), Some("Public domain"));
        assert_eq!(tags.get_str(names::APPLICATION_NAME), Some("Tool & Co"));
        assert_eq!(tags.get_str(names::DEVICE_MODEL), Some("X1"));
        assert_eq!(tags.get(names::DESCRIPTION), None);
        assert_eq!(tags.get(names::DEVICE_MANUFACTURER), None);
        assert_eq!(tags.len(), 4);
    }

    #[test]
    fn rejects_non_rdf() {
        assert!(decode_xmp(b"<html></html>").is_none());
        assert!(decode_xmp(b"\xff\xfe<rdf:RDF>").is_none());
        assert!(decode_xmp(b"<rdf:RDF></rdf:RDF>").is_none());
    }
}
