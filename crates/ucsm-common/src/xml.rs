//! UCS Manager XML API codec.
//!
//! Builds the request documents posted to `/nuova` and parses the answers
//! back into [`ManagedObject`] trees.
//!
//! | method | purpose |
//! |--------|---------|
//! | `aaaLogin` | open a session, returns `outCookie` |
//! | `aaaLogout` | close a session |
//! | `configResolveDn` | fetch one object by dn |
//! | `configResolveChildren` | list children of a dn by class |
//! | `configConfMos` | submit a batch of created/modified/deleted objects |

use std::collections::BTreeMap;
use std::io::Cursor;
use std::str;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{UcsmError, UcsmResult};
use crate::mo::{rn_of, ManagedObject, MoStatus};

/// Login method name.
pub const METHOD_LOGIN: &str = "aaaLogin";

/// Logout method name.
pub const METHOD_LOGOUT: &str = "aaaLogout";

/// Resolve-by-dn method name.
pub const METHOD_RESOLVE_DN: &str = "configResolveDn";

/// Resolve-children method name.
pub const METHOD_RESOLVE_CHILDREN: &str = "configResolveChildren";

/// Batch configuration method name.
pub const METHOD_CONF_MOS: &str = "configConfMos";

/// Elements that only wrap objects in requests and responses.
const WRAPPER_ELEMENTS: &[&str] = &["outConfig", "outConfigs", "inConfig", "inConfigs", "pair"];

/// Attributes that map to [`ManagedObject`] fields instead of `attrs`.
const DN_ATTR: &str = "dn";
const RN_ATTR: &str = "rn";
const STATUS_ATTR: &str = "status";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn new_writer() -> XmlWriter {
    Writer::new(Cursor::new(Vec::new()))
}

fn write(writer: &mut XmlWriter, event: Event<'_>) -> UcsmResult<()> {
    writer
        .write_event(event)
        .map_err(|e| UcsmError::xml(e.to_string()))
}

fn finish(writer: XmlWriter) -> UcsmResult<String> {
    String::from_utf8(writer.into_inner().into_inner()).map_err(|e| UcsmError::xml(e.to_string()))
}

/// Builds a single self-closing method element.
fn method_element(method: &str, attrs: &[(&str, &str)]) -> UcsmResult<String> {
    let mut writer = new_writer();
    let mut elem = BytesStart::new(method);
    for attr in attrs {
        elem.push_attribute(*attr);
    }
    write(&mut writer, Event::Empty(elem))?;
    finish(writer)
}

/// Builds an `aaaLogin` request.
pub fn login_request(username: &str, password: &str) -> UcsmResult<String> {
    method_element(
        METHOD_LOGIN,
        &[("inName", username), ("inPassword", password)],
    )
}

/// Builds an `aaaLogout` request.
pub fn logout_request(cookie: &str) -> UcsmResult<String> {
    method_element(METHOD_LOGOUT, &[("inCookie", cookie)])
}

/// Builds a `configResolveDn` request.
pub fn resolve_dn_request(cookie: &str, dn: &str) -> UcsmResult<String> {
    method_element(
        METHOD_RESOLVE_DN,
        &[("cookie", cookie), ("dn", dn), ("inHierarchical", "false")],
    )
}

/// Builds a `configResolveChildren` request.
pub fn resolve_children_request(cookie: &str, dn: &str, class_id: &str) -> UcsmResult<String> {
    method_element(
        METHOD_RESOLVE_CHILDREN,
        &[
            ("cookie", cookie),
            ("classId", class_id),
            ("inDn", dn),
            ("inHierarchical", "false"),
        ],
    )
}

/// Builds a `configConfMos` request carrying one `pair` per object.
pub fn conf_mos_request(cookie: &str, mos: &[ManagedObject]) -> UcsmResult<String> {
    let mut writer = new_writer();

    let mut root = BytesStart::new(METHOD_CONF_MOS);
    root.push_attribute(("cookie", cookie));
    root.push_attribute(("inHierarchical", "false"));
    write(&mut writer, Event::Start(root))?;
    write(&mut writer, Event::Start(BytesStart::new("inConfigs")))?;

    for mo in mos {
        let mut pair = BytesStart::new("pair");
        pair.push_attribute(("key", mo.dn.as_str()));
        write(&mut writer, Event::Start(pair))?;
        write_mo(&mut writer, mo, true)?;
        write(&mut writer, Event::End(BytesEnd::new("pair")))?;
    }

    write(&mut writer, Event::End(BytesEnd::new("inConfigs")))?;
    write(&mut writer, Event::End(BytesEnd::new(METHOD_CONF_MOS)))?;
    finish(writer)
}

/// Writes one object; top-level objects carry their dn, nested ones their rn.
fn write_mo(writer: &mut XmlWriter, mo: &ManagedObject, top_level: bool) -> UcsmResult<()> {
    let mut elem = BytesStart::new(mo.class_id.as_str());
    if top_level {
        elem.push_attribute((DN_ATTR, mo.dn.as_str()));
    } else {
        elem.push_attribute((RN_ATTR, mo.rn.as_str()));
    }
    for (name, value) in &mo.attrs {
        elem.push_attribute((name.as_str(), value.as_str()));
    }
    if let Some(status) = mo.status {
        elem.push_attribute((STATUS_ATTR, status.as_str()));
    }

    if mo.children.is_empty() {
        return write(writer, Event::Empty(elem));
    }

    write(writer, Event::Start(elem))?;
    for child in &mo.children {
        write_mo(writer, child, false)?;
    }
    write(writer, Event::End(BytesEnd::new(mo.class_id.as_str())))
}

/// A parsed XML API response.
#[derive(Debug, Clone, Default)]
pub struct XmlResponse {
    /// Method name of the root element.
    pub method: String,
    /// Root element attributes (cookie, outCookie, response, ...).
    pub attrs: BTreeMap<String, String>,
    /// Top-level objects found under the output wrappers.
    pub objects: Vec<ManagedObject>,
}

impl XmlResponse {
    /// Gets a root attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

enum Frame {
    Root,
    Wrapper,
    Mo(ManagedObject),
}

fn element_name(e: &BytesStart<'_>) -> UcsmResult<String> {
    str::from_utf8(e.name().as_ref())
        .map(str::to_string)
        .map_err(|_| UcsmError::xml("invalid UTF-8 in element name"))
}

fn element_attrs(e: &BytesStart<'_>) -> UcsmResult<BTreeMap<String, String>> {
    let mut attrs = BTreeMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| UcsmError::xml(e.to_string()))?;
        let key = str::from_utf8(attr.key.as_ref())
            .map_err(|_| UcsmError::xml("invalid UTF-8 in attribute name"))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| UcsmError::xml(e.to_string()))?;
        attrs.insert(key, value.into_owned());
    }
    Ok(attrs)
}

fn build_mo(
    class_id: String,
    mut attrs: BTreeMap<String, String>,
    parent: Option<&ManagedObject>,
) -> UcsmResult<ManagedObject> {
    let status = attrs
        .remove(STATUS_ATTR)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<MoStatus>())
        .transpose()?;
    let rn_attr = attrs.remove(RN_ATTR);
    let dn = match (attrs.remove(DN_ATTR), parent, &rn_attr) {
        (Some(dn), _, _) => dn,
        (None, Some(parent), Some(rn)) => format!("{}/{}", parent.dn, rn),
        (None, _, Some(rn)) => rn.clone(),
        (None, _, None) => {
            return Err(UcsmError::xml(format!(
                "object {} carries neither dn nor rn",
                class_id
            )))
        }
    };
    let rn = rn_attr.unwrap_or_else(|| rn_of(&dn).to_string());

    Ok(ManagedObject {
        class_id,
        dn,
        rn,
        status,
        attrs,
        children: Vec::new(),
    })
}

fn open(stack: &mut Vec<Frame>, response: &mut XmlResponse, e: &BytesStart<'_>) -> UcsmResult<()> {
    let name = element_name(e)?;
    let attrs = element_attrs(e)?;

    if stack.is_empty() {
        response.method = name;
        response.attrs = attrs;
        stack.push(Frame::Root);
        return Ok(());
    }

    if WRAPPER_ELEMENTS.contains(&name.as_str()) {
        stack.push(Frame::Wrapper);
        return Ok(());
    }

    let parent = match stack.last() {
        Some(Frame::Mo(parent)) => Some(parent),
        _ => None,
    };
    let mo = build_mo(name, attrs, parent)?;
    stack.push(Frame::Mo(mo));
    Ok(())
}

fn close(stack: &mut Vec<Frame>, response: &mut XmlResponse) {
    if let Some(Frame::Mo(mo)) = stack.pop() {
        match stack.last_mut() {
            Some(Frame::Mo(parent)) => parent.children.push(mo),
            _ => response.objects.push(mo),
        }
    }
}

/// Parses a response document.
///
/// A root element carrying `errorCode` is turned into [`UcsmError::Api`].
pub fn parse_response(xml: &str) -> UcsmResult<XmlResponse> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut response = XmlResponse::default();
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => open(&mut stack, &mut response, e)?,
            Ok(Event::Empty(ref e)) => {
                open(&mut stack, &mut response, e)?;
                close(&mut stack, &mut response);
            }
            Ok(Event::End(_)) => close(&mut stack, &mut response),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(UcsmError::xml(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if response.method.is_empty() {
        return Err(UcsmError::xml("empty response document"));
    }

    if let Some(code) = response.attr("errorCode") {
        return Err(UcsmError::api(
            response.method.clone(),
            code,
            response.attr("errorDescr").unwrap_or_default(),
        ));
    }

    Ok(response)
}
