//! Project descriptor (`.csproj`) reconciliation.
//!
//! Patching is expressed as a diff: each rule inspects the current tree and
//! returns the [`Edit`]s that would bring its concern in line with the
//! target. Edits are applied rule by rule, so a later rule sees the effect of
//! the earlier ones. A descriptor that already matches yields no edits and is
//! not rewritten.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;
use xmltree::{Element, XMLNode};

use crate::core::Target;
use crate::util::fs::{read_to_string, write_string};

/// Package id of the plugin packager.
pub const PACKAGER: &str = "DalamudPackager";

/// Label of the item group older templates use for direct host references.
pub const HOST_REFS_LABEL: &str = "DalamudRefs";

/// Label of the item group that holds the manifest copy directive.
pub const AUTO_GROUP_LABEL: &str = "PlugsmithAuto";

/// Earlier labels for the manifest copy group, adopted or pruned on patch.
pub const LEGACY_AUTO_GROUP_LABELS: [&str; 1] = ["NunuAuto"];

/// Direct references starting with these are provided by the SDK.
pub const SUPERSEDED_REFERENCE_PREFIXES: [&str; 2] = ["Dalamud", "ImGui"];

/// Copy policy the manifest directive must carry.
pub const COPY_ALWAYS: &str = "Always";

const PROPERTY_GROUP: &str = "PropertyGroup";
const ITEM_GROUP: &str = "ItemGroup";
const REFERENCE: &str = "Reference";
const PACKAGE_REFERENCE: &str = "PackageReference";
const COPY_DIRECTIVE: &str = "None";
const COPY_TO_OUTPUT: &str = "CopyToOutputDirectory";
const MULTI_TARGET_PROPERTY: &str = "TargetFrameworks";

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("invalid project XML: {0}")]
    Parse(String),

    #[error("failed to serialize project XML: {0}")]
    Write(String),
}

/// Inputs that determine the reconciled descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSettings {
    pub target: Target,
    /// Assembly name and root namespace.
    pub internal: String,
    /// Plugin SDK version pinned for API 12.
    pub sdk12: String,
    /// Packager version referenced for API 13.
    pub packager13: String,
}

impl DescriptorSettings {
    /// The properties every reconciled descriptor sets, in write order.
    pub fn properties(&self) -> Vec<(&'static str, String)> {
        vec![
            ("TargetFramework", self.target.framework().to_string()),
            ("Platforms", "x64".to_string()),
            ("Nullable", "enable".to_string()),
            ("ImplicitUsings", "enable".to_string()),
            ("LangVersion", "latest".to_string()),
            ("AllowUnsafeBlocks", "true".to_string()),
            ("AssemblyName", self.internal.clone()),
            ("RootNamespace", self.internal.clone()),
        ]
    }

    /// The `Sdk` attribute value for the target.
    pub fn sdk_reference(&self) -> String {
        self.target.sdk_reference(&self.sdk12)
    }

    /// The manifest file the copy directive refers to.
    pub fn manifest_file_name(&self) -> String {
        format!("{}.yaml", self.internal)
    }
}

/// A single change to the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    SetSdk { from: Option<String>, to: String },
    RemoveSdkElements { count: usize },
    AddPropertyGroup,
    SetProperty { name: &'static str, from: Option<String>, to: String },
    DropExtraProperty { name: &'static str, count: usize },
    RemoveProperty { name: &'static str, count: usize },
    RemoveItemGroup { label: &'static str, count: usize },
    RemoveReference { include: String },
    RemovePackageReference { include: &'static str, count: usize },
    AddPackageReference { include: &'static str, version: String },
    SetPackageVersion { from: Option<String>, to: String },
    DropExtraPackageReferences { count: usize },
    AddItemGroup { label: &'static str },
    RelabelItemGroup { from: &'static str, to: &'static str },
    RemoveEmptyItemGroups { label: &'static str, count: usize },
    AddCopyDirective { include: String },
    SetCopyPolicy { include: String, from: Option<String> },
    DropExtraCopyDirectives { include: String, count: usize },
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::SetSdk { from: Some(from), to } => write!(f, "Sdk: {} -> {}", from, to),
            Edit::SetSdk { from: None, to } => write!(f, "Sdk: set to {}", to),
            Edit::RemoveSdkElements { count } => write!(f, "removed {} <Sdk> element(s)", count),
            Edit::AddPropertyGroup => write!(f, "added PropertyGroup"),
            Edit::SetProperty {
                name,
                from: Some(from),
                to,
            } => write!(f, "{}: {} -> {}", name, from, to),
            Edit::SetProperty {
                name,
                from: None,
                to,
            } => write!(f, "{}: set to {}", name, to),
            Edit::DropExtraProperty { name, count } => {
                write!(f, "{}: removed {} duplicate(s)", name, count)
            }
            Edit::RemoveProperty { name, count } => write!(f, "{}: removed {}", name, count),
            Edit::RemoveItemGroup { label, count } => {
                write!(f, "removed {} ItemGroup(s) labeled {}", count, label)
            }
            Edit::RemoveReference { include } => write!(f, "removed Reference {}", include),
            Edit::RemovePackageReference { include, count } => {
                write!(f, "removed {} PackageReference(s) to {}", count, include)
            }
            Edit::AddPackageReference { include, version } => {
                write!(f, "added PackageReference {} {}", include, version)
            }
            Edit::SetPackageVersion {
                from: Some(from),
                to,
            } => write!(f, "{} version: {} -> {}", PACKAGER, from, to),
            Edit::SetPackageVersion { from: None, to } => {
                write!(f, "{} version: set to {}", PACKAGER, to)
            }
            Edit::DropExtraPackageReferences { count } => {
                write!(f, "removed {} duplicate {} reference(s)", count, PACKAGER)
            }
            Edit::AddItemGroup { label } => write!(f, "added ItemGroup {}", label),
            Edit::RelabelItemGroup { from, to } => {
                write!(f, "ItemGroup label: {} -> {}", from, to)
            }
            Edit::RemoveEmptyItemGroups { label, count } => {
                write!(f, "removed {} empty ItemGroup {}", count, label)
            }
            Edit::AddCopyDirective { include } => write!(f, "added copy directive for {}", include),
            Edit::SetCopyPolicy { include, from } => write!(
                f,
                "{}: copy policy {} -> {}",
                include,
                from.as_deref().unwrap_or("none"),
                COPY_ALWAYS
            ),
            Edit::DropExtraCopyDirectives { include, count } => {
                write!(f, "{}: removed {} extra copy directive(s)", include, count)
            }
        }
    }
}

type Rule = fn(&Element, &DescriptorSettings) -> Vec<Edit>;

/// Reconciliation rules, in application order.
const RULES: [(&str, Rule); 5] = [
    ("sdk", diff_sdk),
    ("properties", diff_properties),
    ("host-references", diff_host_references),
    ("packager", diff_packager),
    ("manifest-copy", diff_manifest_copy),
];

/// A parsed project descriptor.
#[derive(Debug, Clone)]
pub struct Descriptor {
    root: Element,
}

impl Descriptor {
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        let text = text.trim_start_matches('\u{feff}');
        let root =
            Element::parse(text.as_bytes()).map_err(|e| DescriptorError::Parse(e.to_string()))?;
        Ok(Descriptor { root })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = read_to_string(path)?;
        Self::parse(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Serialize with two-space indentation and an XML declaration.
    pub fn to_xml(&self) -> Result<String, DescriptorError> {
        let mut buf = Vec::new();
        let config = xmltree::EmitterConfig::new()
            .perform_indent(true)
            .indent_string("  ");
        self.root
            .write_with_config(&mut buf, config)
            .map_err(|e| DescriptorError::Write(e.to_string()))?;

        let mut xml = String::from_utf8(buf).map_err(|e| DescriptorError::Write(e.to_string()))?;
        if !xml.ends_with('\n') {
            xml.push('\n');
        }
        Ok(xml)
    }

    /// Apply every rule and return the edits made.
    pub fn reconcile(&mut self, settings: &DescriptorSettings) -> Vec<Edit> {
        let mut applied = Vec::new();
        for (name, rule) in RULES {
            let edits = rule(&self.root, settings);
            for edit in &edits {
                tracing::trace!("rule {}: {}", name, edit);
                apply(&mut self.root, edit);
            }
            applied.extend(edits);
        }
        applied
    }

    /// The edits [`Descriptor::reconcile`] would make, without making them.
    pub fn plan(&self, settings: &DescriptorSettings) -> Vec<Edit> {
        self.clone().reconcile(settings)
    }
}

/// Reconcile the descriptor at `path`, rewriting it only when something
/// changed. Returns the edits made.
pub fn patch_descriptor(path: &Path, settings: &DescriptorSettings) -> Result<Vec<Edit>> {
    let mut descriptor = Descriptor::load(path)?;
    let edits = descriptor.reconcile(settings);

    if edits.is_empty() {
        tracing::debug!("{} already reconciled", path.display());
        return Ok(edits);
    }

    for edit in &edits {
        tracing::debug!("{}", edit);
    }
    let xml = descriptor
        .to_xml()
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    write_string(path, &xml)?;

    Ok(edits)
}

// ---- rules -----------------------------------------------------------------

fn diff_sdk(root: &Element, settings: &DescriptorSettings) -> Vec<Edit> {
    let mut edits = Vec::new();
    let want = settings.sdk_reference();
    let current = attr(root, "Sdk");

    if current != Some(want.as_str()) {
        edits.push(Edit::SetSdk {
            from: current.map(str::to_string),
            to: want,
        });
    }

    let sdk_elements = child_elements(root, "Sdk").filter(|e| is_plugin_sdk_element(e)).count();
    if sdk_elements > 0 {
        edits.push(Edit::RemoveSdkElements {
            count: sdk_elements,
        });
    }

    edits
}

fn diff_properties(root: &Element, settings: &DescriptorSettings) -> Vec<Edit> {
    let mut edits = Vec::new();
    let primary = primary_property_group(root);
    if primary.is_none() {
        edits.push(Edit::AddPropertyGroup);
    }

    for (name, value) in settings.properties() {
        let existing: Vec<&Element> = primary
            .map(|g| child_elements(g, name).collect())
            .unwrap_or_default();

        let current = existing.first().map(|e| text_of(e));
        if current.as_deref().map(str::trim) != Some(value.as_str()) {
            edits.push(Edit::SetProperty {
                name,
                from: current,
                to: value,
            });
        }

        let total: usize = unconditioned_property_groups(root)
            .map(|g| child_elements(g, name).count())
            .sum();
        let kept = existing.len().min(1);
        if total > kept {
            edits.push(Edit::DropExtraProperty {
                name,
                count: total - kept,
            });
        }
    }

    let multi: usize = unconditioned_property_groups(root)
        .map(|g| child_elements(g, MULTI_TARGET_PROPERTY).count())
        .sum();
    if multi > 0 {
        edits.push(Edit::RemoveProperty {
            name: MULTI_TARGET_PROPERTY,
            count: multi,
        });
    }

    edits
}

fn diff_host_references(root: &Element, _settings: &DescriptorSettings) -> Vec<Edit> {
    let mut edits = Vec::new();

    let labeled = child_elements(root, ITEM_GROUP)
        .filter(|g| attr(g, "Label") == Some(HOST_REFS_LABEL))
        .count();
    if labeled > 0 {
        edits.push(Edit::RemoveItemGroup {
            label: HOST_REFS_LABEL,
            count: labeled,
        });
    }

    let mut includes: Vec<String> = Vec::new();
    for group in child_elements(root, ITEM_GROUP).filter(|g| attr(g, "Label") != Some(HOST_REFS_LABEL)) {
        for reference in child_elements(group, REFERENCE) {
            let Some(include) = attr(reference, "Include") else {
                continue;
            };
            if is_superseded_reference(include) && !includes.iter().any(|i| i == include) {
                includes.push(include.to_string());
            }
        }
    }
    edits.extend(includes.into_iter().map(|include| Edit::RemoveReference { include }));

    edits
}

fn diff_packager(root: &Element, settings: &DescriptorSettings) -> Vec<Edit> {
    let references: Vec<&Element> = packager_references(root).collect();

    if !settings.target.needs_explicit_packager() {
        return match references.len() {
            0 => Vec::new(),
            count => vec![Edit::RemovePackageReference {
                include: PACKAGER,
                count,
            }],
        };
    }

    let Some(first) = references.first() else {
        return vec![Edit::AddPackageReference {
            include: PACKAGER,
            version: settings.packager13.clone(),
        }];
    };

    let mut edits = Vec::new();
    let current = attr_or_child(first, "Version");
    if current.as_deref() != Some(settings.packager13.as_str()) {
        edits.push(Edit::SetPackageVersion {
            from: current,
            to: settings.packager13.clone(),
        });
    }
    if references.len() > 1 {
        edits.push(Edit::DropExtraPackageReferences {
            count: references.len() - 1,
        });
    }
    edits
}

fn diff_manifest_copy(root: &Element, settings: &DescriptorSettings) -> Vec<Edit> {
    let include = settings.manifest_file_name();
    let mut edits = Vec::new();

    let adopted = match auto_group(root) {
        Some(_) => None,
        None => legacy_auto_group(root),
    };
    let own: Vec<&Element> = match (auto_group(root), adopted) {
        (Some(group), _) => copy_directives(group, &include).collect(),
        (None, Some((label, group))) => {
            edits.push(Edit::RelabelItemGroup {
                from: label,
                to: AUTO_GROUP_LABEL,
            });
            copy_directives(group, &include).collect()
        }
        (None, None) => {
            edits.push(Edit::AddItemGroup {
                label: AUTO_GROUP_LABEL,
            });
            Vec::new()
        }
    };

    match own.first() {
        None => edits.push(Edit::AddCopyDirective {
            include: include.clone(),
        }),
        Some(directive) => {
            let policy = attr_or_child(directive, COPY_TO_OUTPUT);
            if policy.as_deref() != Some(COPY_ALWAYS) {
                edits.push(Edit::SetCopyPolicy {
                    include: include.clone(),
                    from: policy,
                });
            }
        }
    }

    let total: usize = child_elements(root, ITEM_GROUP)
        .map(|g| copy_directives(g, &include).count())
        .sum();
    let kept = own.len().min(1);
    if total > kept {
        edits.push(Edit::DropExtraCopyDirectives {
            include: include.clone(),
            count: total - kept,
        });
    }

    // Leftover legacy groups that held nothing but the directive.
    for label in LEGACY_AUTO_GROUP_LABELS {
        // The first group of an adopted label becomes the managed group.
        let skip = usize::from(adopted.map(|(l, _)| l) == Some(label));
        let count = child_elements(root, ITEM_GROUP)
            .filter(|g| attr(g, "Label") == Some(label))
            .skip(skip)
            .filter(|g| {
                g.children.iter().all(|n| match n {
                    XMLNode::Element(e) => is_copy_directive(e, &include),
                    _ => true,
                })
            })
            .count();
        if count > 0 {
            edits.push(Edit::RemoveEmptyItemGroups { label, count });
        }
    }

    edits
}

// ---- application -----------------------------------------------------------

fn apply(root: &mut Element, edit: &Edit) {
    match edit {
        Edit::SetSdk { to, .. } => {
            root.attributes.insert("Sdk".to_string(), to.clone());
        }
        Edit::RemoveSdkElements { .. } => {
            root.children
                .retain(|n| !matches!(n, XMLNode::Element(e) if e.name == "Sdk" && is_plugin_sdk_element(e)));
        }
        Edit::AddPropertyGroup => {
            root.children
                .insert(0, XMLNode::Element(Element::new(PROPERTY_GROUP)));
        }
        Edit::SetProperty { name, to, .. } => {
            if let Some(group) = primary_property_group_mut(root) {
                let existing = group
                    .children
                    .iter()
                    .position(|n| matches!(n, XMLNode::Element(e) if e.name == *name));
                match existing {
                    Some(index) => {
                        if let XMLNode::Element(property) = &mut group.children[index] {
                            set_text(property, to);
                        }
                    }
                    None => group.children.push(XMLNode::Element(text_element(name, to))),
                }
            }
        }
        Edit::DropExtraProperty { name, .. } => {
            let mut kept = false;
            for (index, group) in unconditioned_property_groups_mut(root).enumerate() {
                group.children.retain(|n| match n {
                    XMLNode::Element(e) if e.name == *name => {
                        let keep = index == 0 && !kept;
                        kept |= keep;
                        keep
                    }
                    _ => true,
                });
            }
        }
        Edit::RemoveProperty { name, .. } => {
            for group in unconditioned_property_groups_mut(root) {
                remove_children(group, |e| e.name == *name);
            }
        }
        Edit::RemoveItemGroup { label, .. } => {
            remove_children(root, |e| e.name == ITEM_GROUP && attr(e, "Label") == Some(*label));
        }
        Edit::RemoveReference { include } => {
            for group in child_elements_mut(root, ITEM_GROUP) {
                remove_children(group, |e| {
                    e.name == REFERENCE && attr(e, "Include") == Some(include.as_str())
                });
            }
        }
        Edit::RemovePackageReference { .. } => {
            for group in child_elements_mut(root, ITEM_GROUP) {
                remove_children(group, is_packager_reference);
            }
        }
        Edit::AddPackageReference { include, version } => {
            let mut reference = Element::new(PACKAGE_REFERENCE);
            reference
                .attributes
                .insert("Include".to_string(), include.to_string());
            reference
                .attributes
                .insert("Version".to_string(), version.clone());
            reference
                .children
                .push(XMLNode::Element(text_element("PrivateAssets", "All")));

            let has_references = root.children.iter().position(|n| {
                matches!(n, XMLNode::Element(g) if g.name == ITEM_GROUP
                    && child_elements(g, PACKAGE_REFERENCE).next().is_some())
            });
            match has_references {
                Some(index) => {
                    if let XMLNode::Element(group) = &mut root.children[index] {
                        group.children.push(XMLNode::Element(reference));
                    }
                }
                None => {
                    let mut group = Element::new(ITEM_GROUP);
                    group.children.push(XMLNode::Element(reference));
                    root.children.push(XMLNode::Element(group));
                }
            }
        }
        Edit::SetPackageVersion { to, .. } => {
            let first = child_elements_mut(root, ITEM_GROUP)
                .flat_map(|g| g.children.iter_mut())
                .find_map(|n| match n {
                    XMLNode::Element(e) if is_packager_reference(e) => Some(e),
                    _ => None,
                });
            if let Some(reference) = first {
                set_attr_or_child(reference, "Version", to);
            }
        }
        Edit::DropExtraPackageReferences { .. } => {
            let mut kept = false;
            for group in child_elements_mut(root, ITEM_GROUP) {
                group.children.retain(|n| match n {
                    XMLNode::Element(e) if is_packager_reference(e) => {
                        let keep = !kept;
                        kept = true;
                        keep
                    }
                    _ => true,
                });
            }
        }
        Edit::AddItemGroup { label } => {
            let mut group = Element::new(ITEM_GROUP);
            group
                .attributes
                .insert("Label".to_string(), label.to_string());
            root.children.push(XMLNode::Element(group));
        }
        Edit::RelabelItemGroup { from, to } => {
            let group = child_elements_mut(root, ITEM_GROUP).find(|g| attr(g, "Label") == Some(*from));
            if let Some(group) = group {
                group.attributes.insert("Label".to_string(), to.to_string());
            }
        }
        Edit::RemoveEmptyItemGroups { label, .. } => {
            remove_children(root, |e| {
                e.name == ITEM_GROUP
                    && attr(e, "Label") == Some(*label)
                    && !e.children.iter().any(|n| matches!(n, XMLNode::Element(_)))
            });
        }
        Edit::AddCopyDirective { include } => {
            if let Some(group) = auto_group_mut(root) {
                let mut directive = Element::new(COPY_DIRECTIVE);
                directive
                    .attributes
                    .insert("Include".to_string(), include.clone());
                directive
                    .attributes
                    .insert(COPY_TO_OUTPUT.to_string(), COPY_ALWAYS.to_string());
                group.children.push(XMLNode::Element(directive));
            }
        }
        Edit::SetCopyPolicy { include, .. } => {
            if let Some(group) = auto_group_mut(root) {
                let first = group.children.iter_mut().find_map(|n| match n {
                    XMLNode::Element(e) if is_copy_directive(e, include) => Some(e),
                    _ => None,
                });
                if let Some(directive) = first {
                    set_attr_or_child(directive, COPY_TO_OUTPUT, COPY_ALWAYS);
                }
            }
        }
        Edit::DropExtraCopyDirectives { include, .. } => {
            let mut seen_auto = false;
            for group in child_elements_mut(root, ITEM_GROUP) {
                let is_auto = !seen_auto && attr(group, "Label") == Some(AUTO_GROUP_LABEL);
                seen_auto |= is_auto;

                let mut kept = false;
                group.children.retain(|n| match n {
                    XMLNode::Element(e) if is_copy_directive(e, include) => {
                        let keep = is_auto && !kept;
                        kept |= keep;
                        keep
                    }
                    _ => true,
                });
            }
        }
    }
}

// ---- tree helpers ----------------------------------------------------------

fn attr<'a>(element: &'a Element, key: &str) -> Option<&'a str> {
    element.attributes.get(key).map(String::as_str)
}

fn child_elements<'a>(parent: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
    parent.children.iter().filter_map(move |n| match n {
        XMLNode::Element(e) if e.name == name => Some(e),
        _ => None,
    })
}

fn child_elements_mut<'a>(
    parent: &'a mut Element,
    name: &'a str,
) -> impl Iterator<Item = &'a mut Element> + 'a {
    parent.children.iter_mut().filter_map(move |n| match n {
        XMLNode::Element(e) if e.name == name => Some(e),
        _ => None,
    })
}

fn remove_children(parent: &mut Element, mut predicate: impl FnMut(&Element) -> bool) {
    parent
        .children
        .retain(|n| !matches!(n, XMLNode::Element(e) if predicate(e)));
}

fn text_of(element: &Element) -> String {
    element
        .children
        .iter()
        .filter_map(|n| match n {
            XMLNode::Text(t) | XMLNode::CData(t) => Some(t.as_str()),
            _ => None,
        })
        .collect()
}

fn set_text(element: &mut Element, value: &str) {
    element
        .children
        .retain(|n| !matches!(n, XMLNode::Text(_) | XMLNode::CData(_)));
    element.children.push(XMLNode::Text(value.to_string()));
}

fn text_element(name: &str, value: &str) -> Element {
    let mut element = Element::new(name);
    element.children.push(XMLNode::Text(value.to_string()));
    element
}

/// MSBuild metadata may be an attribute or a child element.
fn attr_or_child(element: &Element, key: &str) -> Option<String> {
    attr(element, key)
        .map(str::to_string)
        .or_else(|| child_elements(element, key).next().map(|e| text_of(e).trim().to_string()))
}

fn set_attr_or_child(element: &mut Element, key: &str, value: &str) {
    let mut has_child = false;
    for child in child_elements_mut(element, key) {
        set_text(child, value);
        has_child = true;
    }
    if !has_child || element.attributes.get(key).is_some() {
        element
            .attributes
            .insert(key.to_string(), value.to_string());
    }
}

fn is_unconditioned(element: &Element) -> bool {
    attr(element, "Condition").is_none()
}

fn unconditioned_property_groups(root: &Element) -> impl Iterator<Item = &Element> {
    child_elements(root, PROPERTY_GROUP).filter(|g| is_unconditioned(g))
}

fn unconditioned_property_groups_mut(root: &mut Element) -> impl Iterator<Item = &mut Element> {
    child_elements_mut(root, PROPERTY_GROUP).filter(|g| is_unconditioned(g))
}

/// The first property group without a `Condition`.
fn primary_property_group(root: &Element) -> Option<&Element> {
    unconditioned_property_groups(root).next()
}

fn primary_property_group_mut(root: &mut Element) -> Option<&mut Element> {
    unconditioned_property_groups_mut(root).next()
}

fn is_plugin_sdk_element(element: &Element) -> bool {
    attr(element, "Name")
        .map(|name| name.eq_ignore_ascii_case(crate::core::target::PLUGIN_SDK))
        .unwrap_or(false)
}

fn is_superseded_reference(include: &str) -> bool {
    SUPERSEDED_REFERENCE_PREFIXES
        .iter()
        .any(|prefix| include.starts_with(prefix))
}

fn is_packager_reference(element: &Element) -> bool {
    element.name == PACKAGE_REFERENCE
        && attr(element, "Include")
            .map(|i| i.eq_ignore_ascii_case(PACKAGER))
            .unwrap_or(false)
}

fn packager_references(root: &Element) -> impl Iterator<Item = &Element> {
    child_elements(root, ITEM_GROUP)
        .flat_map(|g| child_elements(g, PACKAGE_REFERENCE))
        .filter(|e| is_packager_reference(e))
}

fn is_copy_directive(element: &Element, include: &str) -> bool {
    matches!(element.name.as_str(), "None" | "Content")
        && attr(element, "Include")
            .map(|i| i.eq_ignore_ascii_case(include))
            .unwrap_or(false)
}

fn copy_directives<'a>(group: &'a Element, include: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
    group.children.iter().filter_map(move |n| match n {
        XMLNode::Element(e) if is_copy_directive(e, include) => Some(e),
        _ => None,
    })
}

fn auto_group(root: &Element) -> Option<&Element> {
    child_elements(root, ITEM_GROUP).find(|g| attr(g, "Label") == Some(AUTO_GROUP_LABEL))
}

/// The first group carrying a legacy label, with that label.
fn legacy_auto_group(root: &Element) -> Option<(&'static str, &Element)> {
    child_elements(root, ITEM_GROUP).find_map(|g| {
        LEGACY_AUTO_GROUP_LABELS
            .into_iter()
            .find(|label| attr(g, "Label") == Some(*label))
            .map(|label| (label, g))
    })
}

fn auto_group_mut(root: &mut Element) -> Option<&mut Element> {
    child_elements_mut(root, ITEM_GROUP).find(|g| attr(g, "Label") == Some(AUTO_GROUP_LABEL))
}
