//! Field hierarchy and byte positions.
//!
//! [`HierarchyBuilder`] walks the data description entries of one record type
//! in source order and produces a flat arena of [`Field`]s linked by index.
//! Level numbers alone drive nesting: an entry closes every open group whose
//! level is greater than or equal to its own.
//!
//! Positions are 1-based and inclusive. Only elementary fields advance the
//! cursor; a group spans from its first byte to the last byte of its
//! descendants. REDEFINES rewinds the cursor to the start of the redefined
//! field, and once the redefining field's scope closes the cursor resumes
//! after the longest alternative of that storage.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use copybook_core::field::{Encoding, Field, FieldIndex, FieldKind, OverlaySlot};

use crate::{
    error::{Diagnostic, ErrorCode},
    grammar::{self, Entry, FieldDescriptor},
    interpret::Rules,
    source::SourceLine,
    span::Span,
    storage::{self, MAX_RECORD_LENGTH},
};

/// The fields of one record type with the diagnostics raised building them.
#[derive(Debug, Clone, Default)]
pub struct BuiltRecord {
    fields: Vec<Field>,
    diagnostics: Vec<Diagnostic>,
    record_end: usize,
}

impl BuiltRecord {
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Last byte position reached by the layout cursor.
    pub fn record_end(&self) -> usize {
        self.record_end
    }

    pub fn into_parts(self) -> (Vec<Field>, Vec<Diagnostic>) {
        (self.fields, self.diagnostics)
    }
}

#[derive(Debug, Clone)]
struct OpenGroup {
    index: FieldIndex,
    level: u8,
    span: Span,
    /// USAGE inherited by elementary descendants without one of their own.
    usage: Option<String>,
}

/// Storage shared through REDEFINES that is still being laid out.
#[derive(Debug, Clone, Copy)]
struct Overlay {
    level: u8,
    base: FieldIndex,
    /// Cursor position after the longest alternative seen so far.
    resume: usize,
}

/// Mutable state of one walk over a record type.
struct Walk<'a> {
    rules: &'a Rules,
    fields: Vec<Field>,
    /// Cursor position after each field.
    limits: Vec<usize>,
    /// Source span of each field's entry.
    spans: Vec<Span>,
    diagnostics: Vec<Diagnostic>,
    groups: Vec<OpenGroup>,
    overlays: Vec<Overlay>,
    /// Resume position per overlay base, shared by every alternative.
    shared: HashMap<FieldIndex, usize>,
    last_elementary: Option<FieldIndex>,
    cursor: usize,
    /// Set once a position past [`MAX_RECORD_LENGTH`] was reported.
    too_large: bool,
}

impl<'a> Walk<'a> {
    fn new(rules: &'a Rules) -> Self {
        Self {
            rules,
            fields: Vec::new(),
            limits: Vec::new(),
            spans: Vec::new(),
            diagnostics: Vec::new(),
            groups: Vec::new(),
            overlays: Vec::new(),
            shared: HashMap::new(),
            last_elementary: None,
            cursor: rules.start_position() + rules.discriminator_width(),
            too_large: false,
        }
    }

    fn field(&self, index: FieldIndex) -> &Field {
        &self.fields[index.index()]
    }

    fn field_mut(&mut self, index: FieldIndex) -> &mut Field {
        &mut self.fields[index.index()]
    }

    fn push(&mut self, field: Field, span: Span) -> FieldIndex {
        let index = FieldIndex::new(self.fields.len());
        self.fields.push(field);
        self.limits.push(self.cursor);
        self.spans.push(span);
        index
    }

    /// Returns the position after a field ending before `next`, clamped to
    /// the largest record. `None` means the position does not fit in `usize`.
    ///
    /// The first field past the limit is reported; the walk goes on with
    /// clamped positions.
    fn bounded(&mut self, next: Option<usize>, name: &str, span: Span) -> usize {
        if let Some(next) = next.filter(|&next| next <= MAX_RECORD_LENGTH + 1) {
            return next;
        }
        if !self.too_large {
            self.too_large = true;
            self.diagnostics.push(
                Diagnostic::error(format!(
                    "`{name}` extends the record past {MAX_RECORD_LENGTH} bytes"
                ))
                .with_code(ErrorCode::E305)
                .with_label(span, "record too large")
                .with_help("check the OCCURS counts of this field and its enclosing groups"),
            );
        }
        MAX_RECORD_LENGTH + 1
    }

    /// Closes open groups and resolves open overlays with `level` or deeper,
    /// innermost first. A group closes before an overlay of the same level.
    fn close_scopes(&mut self, level: u8) {
        loop {
            let group = self.groups.last().map(|group| group.level).filter(|&l| l >= level);
            let overlay = self.overlays.last().map(|overlay| overlay.level).filter(|&l| l >= level);
            match (group, overlay) {
                (Some(group), Some(overlay)) if overlay > group => self.resolve_overlay(),
                (Some(_), _) => self.close_group(),
                (None, Some(_)) => self.resolve_overlay(),
                (None, None) => break,
            }
        }
    }

    fn close_group(&mut self) {
        let Some(group) = self.groups.pop() else {
            return;
        };
        let start = self.field(group.index).start_position();
        let repeat = self
            .field(group.index)
            .occurs()
            .filter(|&n| n > 0)
            .map_or(1, |n| n as usize);
        let next = self
            .cursor
            .saturating_sub(start)
            .checked_mul(repeat)
            .and_then(|width| start.checked_add(width));
        let name = self.field(group.index).name().to_string();
        let next = self.bounded(next, &name, group.span);
        let end = if next > start { next - 1 } else { start };

        self.field_mut(group.index).set_extent(start, end);
        self.limits[group.index.index()] = next;
        self.cursor = self.cursor.max(next);
        trace!(
            field = self.field(group.index).name(),
            start = start,
            end = end;
            "Closed group"
        );
    }

    fn resolve_overlay(&mut self) {
        let Some(overlay) = self.overlays.pop() else {
            return;
        };
        let next = self.cursor.max(overlay.resume);
        self.shared.insert(overlay.base, next);
        self.cursor = next;
    }

    fn base_of(&self, index: FieldIndex) -> FieldIndex {
        let mut base = index;
        while let Some(target) = self.field(base).redefines_target() {
            base = target;
        }
        base
    }

    /// Finds the latest non-condition field named `name`.
    fn resolve_target(&self, name: &str) -> Option<FieldIndex> {
        self.fields
            .iter()
            .rposition(|field| !field.is_condition() && field.name().eq_ignore_ascii_case(name))
            .map(FieldIndex::new)
    }

    fn inherited_usage(&self) -> Option<String> {
        self.groups.last().and_then(|group| group.usage.clone())
    }

    fn add_condition(&mut self, descriptor: &FieldDescriptor, entry: &Entry) {
        if !self.rules.config().field_processing().process_conditions() {
            trace!(field = descriptor.name(); "Condition names disabled, entry dropped");
            return;
        }
        let Some(host) = self.last_elementary else {
            self.diagnostics.push(
                Diagnostic::warning(format!(
                    "condition name `{}` has no elementary field to attach to",
                    descriptor.name()
                ))
                .with_code(ErrorCode::E302)
                .with_label(entry.span(), "condition dropped")
                .with_help("level-88 entries must follow the elementary field they describe"),
            );
            return;
        };

        let (start, end) = self.field(host).extent();
        let mut field = field_from(descriptor, entry.line());
        field.set_extent(start, end);
        field.set_host(Some(host));
        let index = self.push(field, entry.span());
        self.field_mut(host).push_condition_name(index);
    }

    fn add_field(&mut self, descriptor: &FieldDescriptor, entry: &Entry) {
        self.close_scopes(descriptor.level());

        let mut field = field_from(descriptor, entry.line());
        let parent = self.groups.last().map(|group| group.index);
        field.set_parent(parent);

        let processing = self.rules.config().field_processing();
        if let Some(target_name) = descriptor.redefines() {
            if processing.process_redefines() {
                self.open_overlay(&mut field, target_name, descriptor, entry);
            }
        }

        let inherited = self.inherited_usage();
        let index = match descriptor.kind() {
            FieldKind::Group => {
                field.set_extent(self.cursor, self.cursor);
                let usage = descriptor.usage().map(str::to_string).or(inherited);
                let index = self.push(field, entry.span());
                self.groups.push(OpenGroup {
                    index,
                    level: descriptor.level(),
                    span: entry.span(),
                    usage,
                });
                index
            }
            _ => {
                let usage = descriptor.usage().map(str::to_string).or(inherited);
                let encoding = self.encoding(usage.as_deref(), descriptor, entry);
                let length = storage::storage_length(
                    FieldKind::Elementary,
                    descriptor.picture_info(),
                    encoding,
                    descriptor.occurs(),
                );
                let next = self.bounded(
                    self.cursor.checked_add(length),
                    descriptor.name(),
                    entry.span(),
                );
                field = field.with_usage(usage, encoding);
                field.place(self.cursor, next.saturating_sub(self.cursor));
                self.cursor = self.cursor.max(next);
                let index = self.push(field, entry.span());
                self.last_elementary = Some(index);
                index
            }
        };

        if let Some(parent) = parent {
            self.field_mut(parent).push_child(index);
        }
        trace!(
            field = self.field(index).name(),
            level = descriptor.level(),
            start = self.field(index).start_position(),
            length = self.field(index).storage_length();
            "Placed field"
        );
    }

    fn encoding(
        &mut self,
        usage: Option<&str>,
        descriptor: &FieldDescriptor,
        entry: &Entry,
    ) -> Encoding {
        match self.rules.usage().resolve(usage) {
            Some(encoding) => encoding,
            None => {
                self.diagnostics.push(
                    Diagnostic::warning(format!(
                        "unknown USAGE `{}` for `{}`, stored as character data",
                        usage.unwrap_or_default(),
                        descriptor.name()
                    ))
                    .with_code(ErrorCode::E202)
                    .with_label(entry.span(), "unmapped usage")
                    .with_help("add the usage to [field_processing.usage_mappings]"),
                );
                Encoding::Character
            }
        }
    }

    fn open_overlay(
        &mut self,
        field: &mut Field,
        target_name: &str,
        descriptor: &FieldDescriptor,
        entry: &Entry,
    ) {
        let Some(target) = self.resolve_target(target_name) else {
            self.diagnostics.push(
                Diagnostic::warning(format!(
                    "`{}` redefines `{target_name}`, which is not defined earlier in the record",
                    descriptor.name()
                ))
                .with_code(ErrorCode::E300)
                .with_label(entry.span(), "laid out sequentially"),
            );
            return;
        };

        let target_level = self.field(target).level();
        if target_level != descriptor.level()
            && self.rules.config().validation().validate_redefines()
        {
            self.diagnostics.push(
                Diagnostic::warning(format!(
                    "`{}` at level {:02} redefines `{}` at level {:02}",
                    descriptor.name(),
                    descriptor.level(),
                    self.field(target).name(),
                    target_level
                ))
                .with_code(ErrorCode::E301)
                .with_label(entry.span(), format!("level {:02} here", descriptor.level()))
                .with_secondary_label(
                    self.spans[target.index()],
                    format!("target declared at level {target_level:02}"),
                )
                .with_help("a redefining entry must have the same level as its target"),
            );
        }

        let base = self.base_of(target);
        let resume = self
            .shared
            .get(&base)
            .copied()
            .unwrap_or(0)
            .max(self.limits[target.index()])
            .max(self.limits[base.index()])
            .max(self.cursor);

        field.set_redefines_target(Some(target));
        self.overlays.push(Overlay {
            level: descriptor.level(),
            base,
            resume,
        });
        self.cursor = self.field(base).start_position();
    }

    /// Records on every field the REDEFINES storage it takes part in,
    /// through itself or an enclosing group.
    fn assign_overlays(&mut self) {
        let bases: HashSet<FieldIndex> = (0..self.fields.len())
            .map(FieldIndex::new)
            .filter(|&index| self.field(index).redefines_target().is_some())
            .map(|index| self.base_of(index))
            .collect();

        for index in (0..self.fields.len()).map(FieldIndex::new) {
            let slots: Vec<OverlaySlot> =
                std::iter::successors(Some(index), |&ancestor| self.field(ancestor).parent())
                    .filter_map(|ancestor| {
                        let base = self.base_of(ancestor);
                        (base != ancestor || bases.contains(&ancestor)).then_some(OverlaySlot {
                            base: base.index(),
                            alternative: ancestor.index(),
                        })
                    })
                    .collect();
            self.field_mut(index).set_overlays(slots);
        }
    }

    fn finish(mut self) -> BuiltRecord {
        self.close_scopes(0);
        self.assign_overlays();
        let record_end = self.cursor.saturating_sub(1);
        let fields = prune(self.fields, self.rules);
        BuiltRecord {
            fields,
            diagnostics: self.diagnostics,
            record_end,
        }
    }
}

fn field_from(descriptor: &FieldDescriptor, line: usize) -> Field {
    let mut field = Field::new(descriptor.level(), descriptor.name(), descriptor.kind())
        .with_picture(descriptor.picture().map(str::to_string))
        .with_occurs(descriptor.occurs())
        .with_redefines(descriptor.redefines().map(str::to_string))
        .with_value(descriptor.value().map(str::to_string))
        .with_line(line);
    if let Some(info) = descriptor.picture_info() {
        field = field.with_picture_info(
            Some(info.category()),
            info.is_signed(),
            info.decimal_places(),
        );
    }
    field
}

/// Drops fillers and excluded names, relinking what remains, and applies
/// output names.
///
/// Pruned fields keep their bytes: positions and overlay slots are not
/// recomputed. A REDEFINES target that was dropped becomes `None`.
fn prune(fields: Vec<Field>, rules: &Rules) -> Vec<Field> {
    let processing = rules.config().field_processing();
    let excluded = |field: &Field| {
        (field.is_filler() && !processing.include_fillers())
            || processing
                .exclude_field_names()
                .iter()
                .any(|name| name.eq_ignore_ascii_case(field.name()))
    };

    let mut remap: Vec<Option<FieldIndex>> = Vec::with_capacity(fields.len());
    let mut next = 0;
    for field in &fields {
        let keep = !excluded(field)
            && field
                .host()
                .is_none_or(|host| remap[host.index()].is_some());
        if keep {
            remap.push(Some(FieldIndex::new(next)));
            next += 1;
        } else {
            remap.push(None);
        }
    }

    let retained_ancestor = |mut parent: Option<FieldIndex>| {
        while let Some(index) = parent {
            if let Some(mapped) = remap[index.index()] {
                return Some(mapped);
            }
            parent = fields[index.index()].parent();
        }
        None
    };
    let mapped = |index: Option<FieldIndex>| index.and_then(|index| remap[index.index()]);

    let mut kept: Vec<Field> = fields
        .iter()
        .zip(&remap)
        .filter(|(_, slot)| slot.is_some())
        .map(|(field, _)| {
            let mut field = field.clone();
            field.set_parent(if field.is_condition() {
                None
            } else {
                retained_ancestor(field.parent())
            });
            field.set_host(mapped(field.host()));
            field.set_redefines_target(mapped(field.redefines_target()));
            field.set_condition_names(
                field
                    .condition_names()
                    .iter()
                    .filter_map(|&index| remap[index.index()])
                    .collect(),
            );
            field.set_children(Vec::new());

            let output_name = processing
                .field_name_mappings()
                .get(field.name())
                .cloned()
                .unwrap_or_else(|| rules.naming().apply(field.name()));
            field.set_output_name(output_name);
            field
        })
        .collect();

    for index in 0..kept.len() {
        if let Some(parent) = kept[index].parent() {
            kept[parent.index()].push_child(FieldIndex::new(index));
        }
    }

    kept
}

/// Builds the field hierarchy of one record type.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyBuilder<'a> {
    rules: &'a Rules,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(rules: &'a Rules) -> Self {
        Self { rules }
    }

    /// Parses and places the data description entries found in `lines`.
    ///
    /// Lines that are not entries are ignored. Entries the grammar rejects
    /// and structural problems become warning diagnostics; the walk always
    /// completes.
    pub fn build<'src>(&self, lines: impl IntoIterator<Item = &'src SourceLine>) -> BuiltRecord {
        let entries = grammar::entries(lines, self.rules.strategy().discriminator_columns());
        self.build_entries(&entries)
    }

    /// Places already joined entries.
    pub fn build_entries(&self, entries: &[Entry]) -> BuiltRecord {
        let mut walk = Walk::new(self.rules);

        for entry in entries {
            let descriptor = match grammar::scan(entry.text(), entry.span()) {
                Ok(Some(descriptor)) => descriptor,
                Ok(None) => {
                    trace!(line = entry.line(); "Not a data description entry");
                    continue;
                }
                Err(diagnostic) => {
                    walk.diagnostics.push(diagnostic);
                    continue;
                }
            };
            match descriptor.kind() {
                FieldKind::Condition => walk.add_condition(&descriptor, entry),
                FieldKind::Group | FieldKind::Elementary => walk.add_field(&descriptor, entry),
            }
        }

        let built = walk.finish();
        debug!(
            fields = built.fields.len(),
            diagnostics = built.diagnostics.len(),
            record_end = built.record_end;
            "Built field hierarchy"
        );
        built
    }
}
