//! Walks every place an action dictionary can hang off a document.
//!
//! The walk is an explicit work stack rather than recursion, so deeply nested
//! page trees or outlines cannot exhaust the call stack. Each indirect object is
//! processed at most once per traversal role, which guarantees termination on
//! cyclic `/Kids`, `/Next` or `/First` links.

use std::collections::HashSet;

use pdfgate_pdf::{as_dict, Dictionary, Object, ObjectId, PdfDocument};
use tracing::{debug, trace, warn};

use crate::action::{ActionKind, ActionNode, SourceLocation};

/// The role an object is visited in. A dictionary can legitimately be both an
/// annotation and a form field, so identity alone is not a sufficient key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Role {
    Action,
    PageNode,
    Annotation,
    Outline,
    Field,
    NameTree,
}

enum Visit<'a> {
    Catalog,
    Action { obj: &'a Object, location: SourceLocation, trigger: Option<String> },
    PageNode(&'a Object),
    Annotation(&'a Object),
    Outline(&'a Object),
    Field(&'a Object),
    NameTree(&'a Object),
}

/// Lazy, single-pass iterator over every action reachable from the catalog.
pub struct ActionLocator<'a> {
    doc: &'a PdfDocument,
    pending: Vec<Visit<'a>>,
    visited: HashSet<(ObjectId, Role)>,
    visits: usize,
    max_visits: Option<usize>,
    truncated: bool,
}

impl<'a> ActionLocator<'a> {
    pub fn new(doc: &'a PdfDocument) -> Self {
        Self {
            doc,
            pending: vec![Visit::Catalog],
            visited: HashSet::new(),
            visits: 0,
            max_visits: None,
            truncated: false,
        }
    }

    /// Stops the walk after `max` visited nodes.
    pub fn with_max_visits(mut self, max: usize) -> Self {
        self.max_visits = Some(max);
        self
    }

    /// True when the visit budget ran out before the walk finished.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn visits(&self) -> usize {
        self.visits
    }

    fn step(&mut self, visit: Visit<'a>) -> Option<ActionNode> {
        match visit {
            Visit::Catalog => {
                self.expand_catalog();
                None
            }
            Visit::Action { obj, location, trigger } => self.visit_action(obj, location, trigger),
            Visit::PageNode(obj) => {
                self.visit_page_node(obj);
                None
            }
            Visit::Annotation(obj) => {
                self.visit_annotation(obj);
                None
            }
            Visit::Outline(obj) => {
                self.visit_outline(obj);
                None
            }
            Visit::Field(obj) => {
                self.visit_field(obj);
                None
            }
            Visit::NameTree(obj) => {
                self.visit_name_tree(obj);
                None
            }
        }
    }

    // Pushes run in reverse so the open action is reported first, then pages,
    // outlines, fields, document events and document scripts.
    fn expand_catalog(&mut self) {
        let doc = self.doc;
        let Some(catalog) = doc.catalog() else {
            return;
        };
        if let Some(names) = self.entry(catalog, b"Names").and_then(as_dict) {
            if let Ok(tree) = names.get(b"JavaScript") {
                self.pending.push(Visit::NameTree(tree));
            }
        }
        self.push_additional_actions(catalog, |_| SourceLocation::DocumentEvent);
        if let Some(acroform) = self.entry(catalog, b"AcroForm").and_then(as_dict) {
            for field in self.array(acroform, b"Fields").iter().rev() {
                self.pending.push(Visit::Field(field));
            }
        }
        if let Some(outlines) = self.entry(catalog, b"Outlines").and_then(as_dict) {
            if let Ok(first) = outlines.get(b"First") {
                self.pending.push(Visit::Outline(first));
            }
        }
        if let Ok(pages) = catalog.get(b"Pages") {
            self.pending.push(Visit::PageNode(pages));
        }
        if let Ok(open) = catalog.get(b"OpenAction") {
            self.push_action(open, SourceLocation::DocumentOpen, None);
        }
    }

    fn visit_action(
        &mut self,
        obj: &'a Object,
        location: SourceLocation,
        trigger: Option<String>,
    ) -> Option<ActionNode> {
        // Destination arrays (e.g. an /OpenAction of [page /Fit]) are not actions.
        let (dict, object) = self.enter(obj, Role::Action)?;
        let subtype = self.name(dict, b"S").unwrap_or_default();
        let kind = ActionKind::classify(subtype, self.name(dict, b"N"));
        if let Ok(next) = dict.get(b"Next") {
            match self.doc.resolve(next) {
                Some(Object::Array(chain)) => {
                    for item in chain.iter().rev() {
                        self.push_action(item, location, trigger.clone());
                    }
                }
                Some(_) => self.push_action(next, location, trigger.clone()),
                None => {}
            }
        }
        let node = ActionNode {
            kind,
            raw_type: String::from_utf8_lossy(subtype).into_owned(),
            location,
            object,
            trigger,
        };
        debug!(kind = %node.kind, location = %node.location, object = ?node.object, "Located action");
        Some(node)
    }

    fn visit_page_node(&mut self, obj: &'a Object) {
        let Some((dict, _)) = self.enter(obj, Role::PageNode) else {
            return;
        };
        for kid in self.array(dict, b"Kids").iter().rev() {
            self.pending.push(Visit::PageNode(kid));
        }
        for annot in self.array(dict, b"Annots").iter().rev() {
            self.pending.push(Visit::Annotation(annot));
        }
        self.push_additional_actions(dict, |event| match event {
            b"C" => SourceLocation::PageClose,
            _ => SourceLocation::PageOpen,
        });
    }

    fn visit_annotation(&mut self, obj: &'a Object) {
        let Some((dict, _)) = self.enter(obj, Role::Annotation) else {
            return;
        };
        self.push_additional_actions(dict, |_| SourceLocation::Annotation);
        if let Ok(action) = dict.get(b"A") {
            self.push_action(action, SourceLocation::Annotation, None);
        }
    }

    fn visit_outline(&mut self, obj: &'a Object) {
        let Some((dict, _)) = self.enter(obj, Role::Outline) else {
            return;
        };
        if let Ok(next) = dict.get(b"Next") {
            self.pending.push(Visit::Outline(next));
        }
        if let Ok(first) = dict.get(b"First") {
            self.pending.push(Visit::Outline(first));
        }
        if let Ok(action) = dict.get(b"A") {
            self.push_action(action, SourceLocation::OutlineItem, None);
        }
    }

    fn visit_field(&mut self, obj: &'a Object) {
        let Some((dict, _)) = self.enter(obj, Role::Field) else {
            return;
        };
        for kid in self.array(dict, b"Kids").iter().rev() {
            self.pending.push(Visit::Field(kid));
        }
        self.push_additional_actions(dict, |_| SourceLocation::FormField);
        if let Ok(action) = dict.get(b"A") {
            self.push_action(action, SourceLocation::FormField, None);
        }
    }

    fn visit_name_tree(&mut self, obj: &'a Object) {
        let Some((dict, _)) = self.enter(obj, Role::NameTree) else {
            return;
        };
        for kid in self.array(dict, b"Kids").iter().rev() {
            self.pending.push(Visit::NameTree(kid));
        }
        let names = self.array(dict, b"Names");
        for pair in names.chunks(2).rev() {
            if let [key, value] = pair {
                let trigger = match self.doc.resolve(key) {
                    Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                    _ => None,
                };
                self.push_action(value, SourceLocation::DocumentScript, trigger);
            }
        }
    }

    fn push_action(&mut self, obj: &'a Object, location: SourceLocation, trigger: Option<String>) {
        self.pending.push(Visit::Action { obj, location, trigger });
    }

    fn push_additional_actions(
        &mut self,
        holder: &'a Dictionary,
        location: impl Fn(&[u8]) -> SourceLocation,
    ) {
        let Some(aa) = self.entry(holder, b"AA").and_then(as_dict) else {
            return;
        };
        let events: Vec<(&'a Vec<u8>, &'a Object)> = aa.iter().collect();
        for (event, action) in events.into_iter().rev() {
            let trigger = String::from_utf8_lossy(event).into_owned();
            self.push_action(action, location(event.as_slice()), Some(trigger));
        }
    }

    /// Marks `obj` visited in `role` and resolves it to a dictionary. Returns
    /// `None` for repeat visits and for anything that is not a dictionary.
    fn enter(&mut self, obj: &'a Object, role: Role) -> Option<(&'a Dictionary, Option<ObjectId>)> {
        let id = match obj {
            Object::Reference(id) => {
                if !self.visited.insert((*id, role)) {
                    trace!(obj = id.0, gen = id.1, ?role, "Skipping visited object");
                    return None;
                }
                Some(*id)
            }
            _ => None,
        };
        let dict = self.doc.resolve(obj).and_then(as_dict)?;
        Some((dict, id))
    }

    fn entry(&self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        dict.get(key).ok().and_then(|obj| self.doc.resolve(obj))
    }

    fn array(&self, dict: &'a Dictionary, key: &[u8]) -> &'a [Object] {
        match self.entry(dict, key) {
            Some(Object::Array(items)) => items.as_slice(),
            _ => &[],
        }
    }

    fn name(&self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
        match self.entry(dict, key) {
            Some(Object::Name(name)) => Some(name.as_slice()),
            _ => None,
        }
    }
}

impl Iterator for ActionLocator<'_> {
    type Item = ActionNode;

    fn next(&mut self) -> Option<ActionNode> {
        while let Some(visit) = self.pending.pop() {
            if self.max_visits.is_some_and(|max| self.visits >= max) {
                warn!(visits = self.visits, pending = self.pending.len() + 1, "Action walk budget exhausted");
                self.truncated = true;
                self.pending.clear();
                return None;
            }
            self.visits += 1;
            if let Some(node) = self.step(visit) {
                return Some(node);
            }
        }
        None
    }
}
