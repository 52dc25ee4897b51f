//! Export of merged graphs in the JCG benchmark format
//!
//! ```json
//! {"reachableMethods": [{"method": {...}, "callSites": [{"declaredTarget": {...}, "line": -1, "pc": 0, "targets": [...]}]}]}
//! ```
//!
//! Only internal nodes become reachable methods. The merged graph does not
//! keep the declared target of a call site, so every edge is exported as its
//! own call site whose declared target is the resolved target.

use serde::{Deserialize, Serialize};
use weave_core::{MergedCallGraph, MethodUri};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JcgMethod {
    pub name: String,
    /// JVM descriptor of the declaring class, e.g. `Lcom/example/Foo;`.
    pub declaring_class: String,
    pub return_type: String,
    pub parameter_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JcgCallSite {
    pub declared_target: JcgMethod,
    pub line: i64,
    pub pc: usize,
    pub targets: Vec<JcgMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JcgReachableMethod {
    pub method: JcgMethod,
    pub call_sites: Vec<JcgCallSite>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JcgDocument {
    pub reachable_methods: Vec<JcgReachableMethod>,
}

impl JcgDocument {
    /// Concatenate the reachable methods of several exports.
    pub fn concat(documents: impl IntoIterator<Item = JcgDocument>) -> Self {
        JcgDocument {
            reachable_methods: documents
                .into_iter()
                .flat_map(|d| d.reachable_methods)
                .collect(),
        }
    }
}

impl JcgMethod {
    /// Decode a method URI. Returns `None` for references that are not
    /// method URIs, such as dynamic call sites.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let parsed = MethodUri::parse(uri).ok()?;
        let (name, rest) = parsed.signature.split_once('(')?;
        let (params, ret) = rest.rsplit_once(')')?;
        let parameter_types = params
            .split(',')
            .filter(|p| !p.is_empty())
            .map(type_descriptor)
            .collect();
        Some(JcgMethod {
            name: name.to_string(),
            declaring_class: class_descriptor(&parsed.namespace, &parsed.type_name),
            return_type: type_descriptor(ret),
            parameter_types,
        })
    }
}

pub fn to_jcg(graph: &MergedCallGraph) -> JcgDocument {
    let mut reachable_methods = Vec::new();
    for (gid, node) in graph.nodes().filter(|(_, n)| n.internal) {
        let Some(method) = JcgMethod::from_uri(&node.uri) else {
            tracing::debug!("Skipping node {} with undecodable URI {}", gid, node.uri);
            continue;
        };
        let call_sites = graph
            .successors(gid)
            .into_iter()
            .filter_map(|target| graph.node(target))
            .filter_map(|target| JcgMethod::from_uri(&target.uri))
            .enumerate()
            .map(|(pc, target)| JcgCallSite {
                declared_target: target.clone(),
                line: -1,
                pc,
                targets: vec![target],
            })
            .collect();
        reachable_methods.push(JcgReachableMethod { method, call_sites });
    }
    JcgDocument { reachable_methods }
}

fn class_descriptor(namespace: &str, type_name: &str) -> String {
    if namespace.is_empty() {
        format!("L{};", type_name)
    } else {
        format!("L{}/{};", namespace.replace('.', "/"), type_name)
    }
}

/// Descriptor of a (percent-encoded) type URI such as `%2Fjava.lang%2FString`.
fn type_descriptor(encoded: &str) -> String {
    let mut uri = encoded.to_string();
    // Array brackets are encoded twice inside parameter lists.
    for _ in 0..3 {
        if !uri.contains('%') {
            break;
        }
        uri = percent_decode(&uri);
    }

    let mut dims = 0;
    while let Some(stripped) = uri.strip_suffix("[]") {
        uri = stripped.to_string();
        dims += 1;
    }

    let base = match uri.strip_prefix('/').and_then(|s| s.split_once('/')) {
        Some(("java.lang", "VoidType")) => "V".to_string(),
        Some(("java.lang", "BooleanType")) => "Z".to_string(),
        Some(("java.lang", "ByteType")) => "B".to_string(),
        Some(("java.lang", "CharacterType")) => "C".to_string(),
        Some(("java.lang", "ShortType")) => "S".to_string(),
        Some(("java.lang", "IntegerType")) => "I".to_string(),
        Some(("java.lang", "LongType")) => "J".to_string(),
        Some(("java.lang", "FloatType")) => "F".to_string(),
        Some(("java.lang", "DoubleType")) => "D".to_string(),
        Some((namespace, name)) => class_descriptor(namespace, name),
        None => uri,
    };
    format!("{}{}", "[".repeat(dims), base)
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
