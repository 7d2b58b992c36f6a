//! XML-RPC request encoding and response decoding.
//!
//! Requests are generated as strings directly; responses are parsed into an
//! [`XmlNode`] tree and converted into [`Value`]s.

use std::collections::BTreeMap;

use quick_xml::escape::escape;

use super::value::Value;
use crate::error::{ClientError, Result};
use crate::xml::XmlNode;

/// Encode a `<methodCall>` document.
pub fn encode_call(method: &str, params: &[Value]) -> Result<String> {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<methodCall>");
    xml.push_str(&format!("<methodName>{}</methodName>", escape(method)));
    xml.push_str("<params>");
    for param in params {
        xml.push_str("<param>");
        write_value(&mut xml, param)?;
        xml.push_str("</param>");
    }
    xml.push_str("</params></methodCall>\n");
    Ok(xml)
}

fn write_value(xml: &mut String, value: &Value) -> Result<()> {
    xml.push_str("<value>");
    match value {
        Value::Int(i) => xml.push_str(&format!("<int>{}</int>", i)),
        Value::I8(i) => xml.push_str(&format!("<i8>{}</i8>", i)),
        Value::Bool(b) => xml.push_str(if *b { "<boolean>1</boolean>" } else { "<boolean>0</boolean>" }),
        Value::Double(d) => {
            if !d.is_finite() {
                return Err(ClientError::Transport(format!(
                    "cannot encode non-finite double {}",
                    d
                )));
            }
            xml.push_str(&format!("<double>{}</double>", d));
        }
        Value::String(s) => xml.push_str(&format!("<string>{}</string>", escape(s.as_str()))),
        Value::Array(items) => {
            xml.push_str("<array><data>");
            for item in items {
                write_value(xml, item)?;
            }
            xml.push_str("</data></array>");
        }
        Value::Struct(members) => {
            xml.push_str("<struct>");
            for (name, member) in members {
                xml.push_str(&format!("<member><name>{}</name>", escape(name.as_str())));
                write_value(xml, member)?;
                xml.push_str("</member>");
            }
            xml.push_str("</struct>");
        }
        Value::Nil => xml.push_str("<nil/>"),
    }
    xml.push_str("</value>");
    Ok(())
}

/// Decode a `<methodResponse>` document into its single result value.
///
/// A `<fault>` response becomes [`ClientError::Fault`].
pub fn decode_response(text: &str) -> Result<Value> {
    let root = XmlNode::parse(text)
        .map_err(|e| ClientError::Transport(format!("malformed XML-RPC response: {}", e)))?;

    if root.name() != "methodResponse" {
        return Err(ClientError::Transport(format!(
            "expected <methodResponse>, got <{}>",
            root.name()
        )));
    }

    if let Some(fault) = root.find_first("fault/value") {
        let fault = decode_value(fault)?;
        let members = fault.as_struct().ok_or_else(|| {
            ClientError::Transport("XML-RPC fault is not a struct".to_string())
        })?;
        let code = members
            .get("faultCode")
            .and_then(Value::as_i32)
            .ok_or_else(|| ClientError::Transport("XML-RPC fault without faultCode".to_string()))?;
        let message = members
            .get("faultString")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Transport("XML-RPC fault without faultString".to_string()))?
            .to_string();
        return Err(ClientError::Fault { code, message });
    }

    let value = root.find_first("params/param/value").ok_or_else(|| {
        ClientError::Transport("XML-RPC response carries no value".to_string())
    })?;
    decode_value(value)
}

/// Decode one `<value>` element.
pub fn decode_value(node: &XmlNode) -> Result<Value> {
    let typed = match node.children().first() {
        Some(typed) => typed,
        // An untyped <value> is a string
        None => return Ok(Value::String(node.text().to_string())),
    };

    let text = typed.text();
    match typed.name() {
        "int" | "i4" => text
            .trim()
            .parse::<i32>()
            .map(Value::Int)
            .map_err(|_| invalid_scalar("int", text)),
        "i8" => text
            .trim()
            .parse::<i64>()
            .map(Value::I8)
            .map_err(|_| invalid_scalar("i8", text)),
        "boolean" => match text.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            _ => Err(invalid_scalar("boolean", text)),
        },
        "double" => text
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| invalid_scalar("double", text)),
        "string" | "dateTime.iso8601" | "base64" => Ok(Value::String(text.to_string())),
        "nil" => Ok(Value::Nil),
        "array" => typed
            .find("data/value")
            .into_iter()
            .map(decode_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.find("member") {
                let name = member
                    .find_first("name")
                    .map(|n| n.text().to_string())
                    .ok_or_else(|| ClientError::Transport("struct member without name".to_string()))?;
                let value = member.find_first("value").ok_or_else(|| {
                    ClientError::Transport(format!("struct member '{}' without value", name))
                })?;
                members.insert(name, decode_value(value)?);
            }
            Ok(Value::Struct(members))
        }
        other => Err(ClientError::Transport(format!(
            "unsupported XML-RPC type <{}>",
            other
        ))),
    }
}

fn invalid_scalar(kind: &str, text: &str) -> ClientError {
    ClientError::Transport(format!("invalid <{}> value '{}'", kind, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_call() {
        let xml = encode_call(
            "one.vm.action",
            &[Value::from("oneadmin:secret"), Value::from("poweroff"), Value::from(42)],
        )
        .unwrap();

        assert!(xml.contains("<methodName>one.vm.action</methodName>"));
        assert!(xml.contains("<param><value><string>oneadmin:secret</string></value></param>"));
        assert!(xml.contains("<param><value><int>42</int></value></param>"));
    }

    #[test]
    fn test_encode_escapes_and_nests() {
        let xml = encode_call(
            "one.user.allocate",
            &[
                Value::from("NAME = \"<a&b>\""),
                Value::from(vec![Value::from(1), Value::from(false)]),
                Value::Nil,
            ],
        )
        .unwrap();

        assert!(xml.contains("&lt;a&amp;b&gt;"));
        assert!(xml.contains(
            "<array><data><value><int>1</int></value><value><boolean>0</boolean></value></data></array>"
        ));
        assert!(xml.contains("<value><nil/></value>"));
    }

    #[test]
    fn test_encode_rejects_non_finite_double() {
        let err = encode_call("x", &[Value::Double(f64::NAN)]).unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[test]
    fn test_decode_success_array() {
        let response = r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param>
      <value>
        <array>
          <data>
            <value><boolean>1</boolean></value>
            <value><string>&lt;VM&gt;&lt;ID&gt;4&lt;/ID&gt;&lt;/VM&gt;</string></value>
            <value><i4>0</i4></value>
            <value>untyped</value>
            <value><i8>8589934592</i8></value>
          </data>
        </array>
      </value>
    </param>
  </params>
</methodResponse>"#;

        let value = decode_response(response).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0], Value::Bool(true));
        assert_eq!(items[1].as_str(), Some("<VM><ID>4</ID></VM>"));
        assert_eq!(items[2], Value::Int(0));
        assert_eq!(items[3].as_str(), Some("untyped"));
        assert_eq!(items[4], Value::I8(8_589_934_592));
    }

    #[test]
    fn test_decode_fault() {
        let response = r#"<methodResponse><fault><value><struct>
            <member><name>faultCode</name><value><int>-501</int></value></member>
            <member><name>faultString</name><value><string>No such method</string></value></member>
        </struct></value></fault></methodResponse>"#;

        match decode_response(response) {
            Err(ClientError::Fault { code, message }) => {
                assert_eq!(code, -501);
                assert_eq!(message, "No such method");
            }
            other => panic!("expected fault, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_incomplete_fault() {
        let empty = "<methodResponse><fault><value><struct></struct></value></fault></methodResponse>";
        match decode_response(empty) {
            Err(ClientError::Transport(message)) => assert!(message.contains("faultCode")),
            other => panic!("expected transport error, got {:?}", other),
        }

        let no_string = r#"<methodResponse><fault><value><struct>
            <member><name>faultCode</name><value><int>4</int></value></member>
        </struct></value></fault></methodResponse>"#;
        match decode_response(no_string) {
            Err(ClientError::Transport(message)) => assert!(message.contains("faultString")),
            other => panic!("expected transport error, got {:?}", other),
        }

        let string_code = r#"<methodResponse><fault><value><struct>
            <member><name>faultCode</name><value><string>4</string></value></member>
            <member><name>faultString</name><value><string>bad</string></value></member>
        </struct></value></fault></methodResponse>"#;
        assert!(matches!(decode_response(string_code), Err(ClientError::Transport(_))));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_response("<html>oops</html>"), Err(ClientError::Transport(_))));
        assert!(matches!(decode_response("not xml <"), Err(ClientError::Transport(_))));
        assert!(matches!(
            decode_response("<methodResponse><params><param><value><int>x</int></value></param></params></methodResponse>"),
            Err(ClientError::Transport(_))
        ));
    }

    #[test]
    fn test_encode_decode_struct() {
        let mut members = BTreeMap::new();
        members.insert("a".to_string(), Value::Double(1.5));
        members.insert("b".to_string(), Value::from("x"));
        let call = encode_call("m", &[Value::Struct(members.clone())]).unwrap();

        let root = XmlNode::parse(&call).unwrap();
        let value = root.find_first("params/param/value").unwrap();
        assert_eq!(decode_value(value).unwrap(), Value::Struct(members));
    }
}
