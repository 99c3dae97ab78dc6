//! IGES entities and the protocol every entity type implements

pub mod color_definition;
pub mod composite_curve;
pub mod line;
pub mod link;
pub mod null;
pub mod point;
pub mod status;
pub mod subfigure_definition;
pub mod subfigure_instance;
pub mod transformation_matrix;

pub use color_definition::ColorDefinition;
pub use composite_curve::CompositeCurve;
pub use line::Line;
pub use link::{Link, PointerRole, ValueOrEntity};
pub use null::NullEntity;
pub use point::Point;
pub use status::{BlankStatus, EntityUse, Hierarchy, StatusNumber, Subordinate};
pub use subfigure_definition::SubfigureDefinition;
pub use subfigure_instance::SubfigureInstance;
pub use transformation_matrix::TransformationMatrix;

use crate::error::{IgesError, Result};
use crate::global::GlobalData;
use crate::io::iges::directory::DirectoryEntry;
use crate::io::iges::field_codec::{ParameterReader, RecordPacker};
use crate::io::iges::record::{Record, Section, PARAMETER_DATA_WIDTH};
use crate::types::{ColorNumber, Handle, Vector3};
use ahash::AHashMap;
use indexmap::IndexMap;

/// Entity type numbers that describe curves
pub const CURVE_TYPES: [i32; 8] = [100, 102, 104, 106, 110, 112, 126, 130];

/// Lifecycle of an entity through load, association and store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityState {
    #[default]
    Unparsed,
    DirectoryRead,
    ParametersRead,
    Associated,
    Formatted,
    /// A step failed; the entity must not be used further
    Invalid,
}

/// Context for formatting Parameter Data
///
/// Maps every live handle to the DE sequence number it is written under.
pub struct FormatContext<'a> {
    pub global: &'a GlobalData,
    pub sequences: &'a AHashMap<Handle, i32>,
}

impl FormatContext<'_> {
    /// DE sequence number a link is written as
    pub fn pointer(&self, link: Link) -> Result<i32> {
        match link {
            Link::Bound(handle) => self
                .sequences
                .get(&handle)
                .copied()
                .ok_or(IgesError::EntityNotFound(handle)),
            Link::Pending(sequence) => Err(IgesError::Format(format!(
                "pointer to DE {} was never associated",
                sequence
            ))),
        }
    }

    /// Like [`pointer`](Self::pointer), with 0 for a null link
    pub fn optional_pointer(&self, link: Option<Link>) -> Result<i32> {
        link.map_or(Ok(0), |link| self.pointer(link))
    }
}

/// Directory Entry state, references and trailing data shared by all entities
#[derive(Debug, Clone, PartialEq)]
pub struct EntityCommon {
    /// Sequence number of the first DE record
    pub sequence: i32,
    pub form: i32,
    pub structure: Option<Link>,
    pub line_font: ValueOrEntity<i32>,
    pub level: ValueOrEntity<i32>,
    pub view: Option<Link>,
    pub transform: Option<Link>,
    pub label_display: Option<Link>,
    pub status: StatusNumber,
    pub line_weight: i32,
    pub color: ValueOrEntity<ColorNumber>,
    /// Parameter Data lines used when last read or written
    pub parameter_line_count: i32,
    pub label: String,
    pub subscript: i32,
    /// First group of extra pointers
    pub associativities: Vec<Link>,
    /// Second group of extra pointers
    pub properties: Vec<Link>,
    pub comments: Vec<String>,
    refs: IndexMap<Handle, usize>,
    state: EntityState,
}

impl EntityCommon {
    /// Common data for a new entity; the subordinate switch starts dependent
    pub fn new() -> Self {
        EntityCommon {
            sequence: 0,
            form: 0,
            structure: None,
            line_font: ValueOrEntity::default(),
            level: ValueOrEntity::default(),
            view: None,
            transform: None,
            label_display: None,
            status: StatusNumber {
                subordinate: Subordinate::PhysicallyDependent,
                ..Default::default()
            },
            line_weight: 0,
            color: ValueOrEntity::default(),
            parameter_line_count: 0,
            label: String::new(),
            subscript: 0,
            associativities: Vec::new(),
            properties: Vec::new(),
            comments: Vec::new(),
            refs: IndexMap::new(),
            state: EntityState::Unparsed,
        }
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: EntityState) {
        self.state = state;
    }

    /// Record one more edge from `parent`
    pub fn add_reference(&mut self, parent: Handle) {
        *self.refs.entry(parent).or_insert(0) += 1;
    }

    /// Drop one edge from `parent`; `false` if `parent` holds none
    pub fn del_reference(&mut self, parent: Handle) -> bool {
        match self.refs.get_mut(&parent) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.refs.shift_remove(&parent);
                true
            }
            None => false,
        }
    }

    /// Forget every parent; used when an entity enters a document afresh
    pub(crate) fn clear_references(&mut self) {
        self.refs.clear();
    }

    /// Number of distinct entities pointing at this one
    pub fn ref_count(&self) -> usize {
        self.refs.len()
    }

    /// Number of edges `parent` holds to this entity
    pub fn edge_count(&self, parent: Handle) -> usize {
        self.refs.get(&parent).copied().unwrap_or(0)
    }

    /// Distinct referencing entities, in the order they first referenced this one
    pub fn references(&self) -> impl Iterator<Item = Handle> + '_ {
        self.refs.keys().copied()
    }

    /// Nothing refers to the entity and it cannot stand alone
    pub fn is_orphaned(&self) -> bool {
        self.refs.is_empty() && self.status.is_dependent()
    }

    /// Copy the fields of a Directory Entry; pointers stay pending
    pub fn read_directory(&mut self, de: &DirectoryEntry) -> Result<()> {
        let value_or_link = |raw: i32| -> ValueOrEntity<i32> {
            if raw < 0 {
                ValueOrEntity::Entity(Link::Pending(-raw))
            } else {
                ValueOrEntity::Value(raw)
            }
        };

        self.sequence = de.sequence;
        self.form = de.form;
        self.structure = Link::from_raw(de.structure);
        self.line_font = value_or_link(de.line_font);
        self.level = value_or_link(de.level);
        self.view = Link::from_raw(de.view);
        self.transform = Link::from_raw(de.transform);
        self.label_display = Link::from_raw(de.label_display);
        self.status = de.status;
        self.line_weight = de.line_weight;
        self.color = if de.color < 0 {
            ValueOrEntity::Entity(Link::Pending(-de.color))
        } else {
            ValueOrEntity::Value(ColorNumber::from_index(de.color).ok_or_else(|| {
                IgesError::Parse(format!("DE {}: invalid color number {}", de.sequence, de.color))
            })?)
        };
        self.parameter_line_count = de.parameter_line_count;
        self.label = de.label.clone();
        self.subscript = de.subscript;
        self.state = EntityState::DirectoryRead;
        Ok(())
    }

    /// Build the Directory Entry to write
    pub fn directory_entry(
        &self,
        entity_type: i32,
        parameter_data: i32,
        ctx: &FormatContext<'_>,
    ) -> Result<DirectoryEntry> {
        let value_or_link = |field: &ValueOrEntity<i32>| -> Result<i32> {
            match field {
                ValueOrEntity::Value(v) => Ok(*v),
                ValueOrEntity::Entity(link) => Ok(-ctx.pointer(*link)?),
            }
        };

        Ok(DirectoryEntry {
            entity_type,
            parameter_data,
            structure: -ctx.optional_pointer(self.structure)?,
            line_font: value_or_link(&self.line_font)?,
            level: value_or_link(&self.level)?,
            view: ctx.optional_pointer(self.view)?,
            transform: ctx.optional_pointer(self.transform)?,
            label_display: ctx.optional_pointer(self.label_display)?,
            status: self.status,
            line_weight: self.line_weight,
            color: match self.color {
                ValueOrEntity::Value(color) => color.index(),
                ValueOrEntity::Entity(link) => -ctx.pointer(link)?,
            },
            parameter_line_count: self.parameter_line_count,
            form: self.form,
            label: self.label.clone(),
            subscript: self.subscript,
            sequence: self.sequence,
        })
    }

    /// Directory and extras pointers with their roles
    pub fn links(&self) -> Vec<(PointerRole, Link)> {
        let mut links = Vec::new();
        let singles = [
            (PointerRole::Structure, self.structure),
            (PointerRole::LineFont, self.line_font.link()),
            (PointerRole::Level, self.level.link()),
            (PointerRole::View, self.view),
            (PointerRole::Transform, self.transform),
            (PointerRole::LabelDisplay, self.label_display),
            (PointerRole::Color, self.color.link()),
        ];
        for (role, link) in singles {
            if let Some(link) = link {
                links.push((role, link));
            }
        }
        for (i, link) in self.associativities.iter().enumerate() {
            links.push((PointerRole::Associativity(i), *link));
        }
        for (i, link) in self.properties.iter().enumerate() {
            links.push((PointerRole::Property(i), *link));
        }
        links
    }

    /// Visit every directory and extras pointer in place
    pub fn visit_links_mut(&mut self, visit: &mut dyn FnMut(PointerRole, &mut Link)) {
        if let Some(link) = self.structure.as_mut() {
            visit(PointerRole::Structure, link);
        }
        if let ValueOrEntity::Entity(link) = &mut self.line_font {
            visit(PointerRole::LineFont, link);
        }
        if let ValueOrEntity::Entity(link) = &mut self.level {
            visit(PointerRole::Level, link);
        }
        if let Some(link) = self.view.as_mut() {
            visit(PointerRole::View, link);
        }
        if let Some(link) = self.transform.as_mut() {
            visit(PointerRole::Transform, link);
        }
        if let Some(link) = self.label_display.as_mut() {
            visit(PointerRole::LabelDisplay, link);
        }
        if let ValueOrEntity::Entity(link) = &mut self.color {
            visit(PointerRole::Color, link);
        }
        for (i, link) in self.associativities.iter_mut().enumerate() {
            visit(PointerRole::Associativity(i), link);
        }
        for (i, link) in self.properties.iter_mut().enumerate() {
            visit(PointerRole::Property(i), link);
        }
    }

    /// Null every directory and extras pointer to `child`; returns the edges removed
    pub fn unlink(&mut self, child: Handle) -> usize {
        let mut removed = 0;
        for slot in [&mut self.structure, &mut self.view, &mut self.transform, &mut self.label_display] {
            if slot.is_some_and(|link| link.targets(child)) {
                *slot = None;
                removed += 1;
            }
        }
        for field in [&mut self.line_font, &mut self.level] {
            if field.link().is_some_and(|link| link.targets(child)) {
                *field = ValueOrEntity::Value(0);
                removed += 1;
            }
        }
        if self.color.link().is_some_and(|link| link.targets(child)) {
            self.color = ValueOrEntity::Value(ColorNumber::NoColor);
            removed += 1;
        }
        removed += unlink_list(&mut self.associativities, child);
        removed += unlink_list(&mut self.properties, child);
        removed
    }

    /// Replace the pointer held in a directory or extras role
    ///
    /// Returns the link that was there before.
    pub fn replace_link(&mut self, role: PointerRole, link: Option<Link>) -> Result<Option<Link>> {
        let swap = |slot: &mut Option<Link>| std::mem::replace(slot, link);
        let swap_value = |field: &mut ValueOrEntity<i32>| {
            let old = field.link();
            *field = match link {
                Some(link) => ValueOrEntity::Entity(link),
                None => ValueOrEntity::Value(0),
            };
            old
        };

        Ok(match role {
            PointerRole::Structure => swap(&mut self.structure),
            PointerRole::View => swap(&mut self.view),
            PointerRole::Transform => swap(&mut self.transform),
            PointerRole::LabelDisplay => swap(&mut self.label_display),
            PointerRole::LineFont => swap_value(&mut self.line_font),
            PointerRole::Level => swap_value(&mut self.level),
            PointerRole::Color => {
                let old = self.color.link();
                self.color = match link {
                    Some(link) => ValueOrEntity::Entity(link),
                    None => ValueOrEntity::Value(ColorNumber::NoColor),
                };
                old
            }
            PointerRole::Associativity(index) => replace_in_list(&mut self.associativities, index, link)?,
            PointerRole::Property(index) => replace_in_list(&mut self.properties, index, link)?,
            PointerRole::Parameter { .. } => {
                return Err(IgesError::Custom(format!(
                    "{} is not a directory or extras pointer",
                    role
                )))
            }
        })
    }
}

impl Default for EntityCommon {
    fn default() -> Self {
        Self::new()
    }
}

/// Capabilities every entity type provides
pub trait Entity {
    /// Shared Directory Entry state
    fn common(&self) -> &EntityCommon;

    fn common_mut(&mut self) -> &mut EntityCommon;

    /// IGES entity type number
    fn type_number(&self) -> i32;

    /// Human readable type name
    fn type_name(&self) -> &'static str;

    /// Whether `form` is legal for this type
    fn accepts_form(&self, form: i32) -> bool;

    /// Whether the entity may carry a pointer in `role` at all
    fn allows_role(&self, _role: PointerRole) -> bool {
        true
    }

    /// Whether a type-specific pointer in `role` may target an entity of `target_type`
    fn accepts_target(&self, _role: PointerRole, _target_type: i32) -> bool {
        true
    }

    /// Parse the type-specific fields following the entity type number
    fn read_parameters(&mut self, reader: &mut ParameterReader) -> Result<()>;

    /// Queue the type-specific fields following the entity type number
    fn write_parameters(&self, packer: &mut RecordPacker, ctx: &FormatContext<'_>) -> Result<()>;

    /// Multiply every linear quantity the entity owns by `factor`
    fn rescale(&mut self, factor: f64);

    /// Type-specific pointers in Parameter Data order
    fn parameter_links(&self) -> Vec<(PointerRole, Link)> {
        Vec::new()
    }

    fn visit_parameter_links_mut(&mut self, _visit: &mut dyn FnMut(PointerRole, &mut Link)) {}

    /// Drop every type-specific pointer to `child`; returns the edges removed
    fn unlink_parameters(&mut self, _child: Handle) -> usize {
        0
    }

    /// Replace a type-specific pointer, returning the previous one
    fn set_parameter_link(&mut self, role: PointerRole, _link: Option<Link>) -> Result<Option<Link>> {
        Err(IgesError::Custom(format!(
            "{} has no {} pointer",
            self.type_name(),
            role
        )))
    }

    /// Append to a type-specific pointer list
    fn append_parameter_link(&mut self, role: PointerRole, _link: Link) -> Result<()> {
        Err(IgesError::Custom(format!(
            "{} has no {} pointer list",
            self.type_name(),
            role
        )))
    }

    fn as_curve(&self) -> Option<&dyn Curve> {
        None
    }
}

/// Endpoint queries for curve entities
pub trait Curve {
    /// Start point in definition space, `None` for curves made of segments
    fn start_point(&self) -> Option<Vector3>;

    fn end_point(&self) -> Option<Vector3>;

    /// Constituent curves, empty for primitive curves
    fn segments(&self) -> &[Link] {
        &[]
    }
}

/// Whether a directory role may point at an entity of `target_type`
pub fn directory_role_accepts(role: PointerRole, target_type: i32) -> bool {
    match role {
        PointerRole::Transform => target_type == 124,
        PointerRole::Color => target_type == 314,
        _ => true,
    }
}

/// Read a count followed by that many non-null pointers
pub(crate) fn read_link_list(reader: &mut ParameterReader, what: &str) -> Result<Vec<Link>> {
    let count = reader.read_int(&format!("{} count", what))?;
    if count < 0 {
        return Err(IgesError::Parse(format!("negative {} count {}", what, count)));
    }
    let mut links = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let raw = reader.read_pointer(what)?;
        let link = Link::from_raw(raw)
            .ok_or_else(|| IgesError::Parse(format!("null {} pointer", what)))?;
        links.push(link);
    }
    Ok(links)
}

/// Queue a count followed by the pointers
pub(crate) fn write_link_list(
    packer: &mut RecordPacker,
    ctx: &FormatContext<'_>,
    links: &[Link],
) -> Result<()> {
    packer.push_int(links.len() as i32);
    for link in links {
        packer.push_pointer(ctx.pointer(*link)?);
    }
    Ok(())
}

/// Replace (`Some`) or remove (`None`) the link at `index`; `index == len` appends
pub(crate) fn replace_in_list(list: &mut Vec<Link>, index: usize, link: Option<Link>) -> Result<Option<Link>> {
    match (index.cmp(&list.len()), link) {
        (std::cmp::Ordering::Less, Some(link)) => Ok(Some(std::mem::replace(&mut list[index], link))),
        (std::cmp::Ordering::Less, None) => Ok(Some(list.remove(index))),
        (std::cmp::Ordering::Equal, Some(link)) => {
            list.push(link);
            Ok(None)
        }
        _ => Err(IgesError::Custom(format!(
            "pointer index {} out of range for a list of {}",
            index,
            list.len()
        ))),
    }
}

pub(crate) fn unlink_list(list: &mut Vec<Link>, child: Handle) -> usize {
    let before = list.len();
    list.retain(|link| !link.targets(child));
    before - list.len()
}

fn read_extras(reader: &mut ParameterReader, common: &mut EntityCommon) -> Result<()> {
    let group = |reader: &mut ParameterReader, what: &str| -> Result<Vec<Link>> {
        let count = reader.read_int_or(&format!("{} count", what), 0)?;
        if count < 0 {
            return Err(IgesError::Parse(format!("negative {} count {}", what, count)));
        }
        let mut links = Vec::with_capacity(count as usize);
        for _ in 0..count {
            if let Some(link) = Link::from_raw(reader.read_pointer(what)?) {
                links.push(link);
            }
        }
        Ok(links)
    };

    common.associativities = group(reader, "associativity")?;
    if !reader.is_end_of_record() {
        common.properties = group(reader, "property")?;
    }
    if !reader.is_end_of_record() {
        return Err(IgesError::Parse(format!(
            "DE {}: unexpected parameters after the property pointers",
            common.sequence
        )));
    }
    Ok(())
}

/// Enumeration of all entity types
#[derive(Debug, Clone)]
pub enum EntityType {
    /// Type 0, and any type this crate does not model
    Null(NullEntity),
    /// Type 102
    CompositeCurve(CompositeCurve),
    /// Type 110
    Line(Line),
    /// Type 116
    Point(Point),
    /// Type 124
    TransformationMatrix(TransformationMatrix),
    /// Type 308
    SubfigureDefinition(SubfigureDefinition),
    /// Type 314
    ColorDefinition(ColorDefinition),
    /// Type 408
    SubfigureInstance(SubfigureInstance),
}

impl EntityType {
    /// Get a reference to the entity trait object
    pub fn as_entity(&self) -> &dyn Entity {
        match self {
            EntityType::Null(e) => e,
            EntityType::CompositeCurve(e) => e,
            EntityType::Line(e) => e,
            EntityType::Point(e) => e,
            EntityType::TransformationMatrix(e) => e,
            EntityType::SubfigureDefinition(e) => e,
            EntityType::ColorDefinition(e) => e,
            EntityType::SubfigureInstance(e) => e,
        }
    }

    /// Get a mutable reference to the entity trait object
    pub fn as_entity_mut(&mut self) -> &mut dyn Entity {
        match self {
            EntityType::Null(e) => e,
            EntityType::CompositeCurve(e) => e,
            EntityType::Line(e) => e,
            EntityType::Point(e) => e,
            EntityType::TransformationMatrix(e) => e,
            EntityType::SubfigureDefinition(e) => e,
            EntityType::ColorDefinition(e) => e,
            EntityType::SubfigureInstance(e) => e,
        }
    }

    /// Whether the type number has a dedicated variant
    pub fn is_supported(entity_type: i32) -> bool {
        matches!(entity_type, 0 | 102 | 110 | 116 | 124 | 308 | 314 | 408)
    }

    /// Construct an empty entity of the given type and form
    pub fn create(entity_type: i32, form: i32) -> Result<Self> {
        let mut entity = match entity_type {
            0 => EntityType::Null(NullEntity::new()),
            102 => EntityType::CompositeCurve(CompositeCurve::new()),
            110 => EntityType::Line(Line::new()),
            116 => EntityType::Point(Point::new()),
            124 => EntityType::TransformationMatrix(TransformationMatrix::new()),
            308 => EntityType::SubfigureDefinition(SubfigureDefinition::new()),
            314 => EntityType::ColorDefinition(ColorDefinition::new()),
            408 => EntityType::SubfigureInstance(SubfigureInstance::new()),
            other => return Err(IgesError::UnsupportedEntityType(other)),
        };
        if !entity.as_entity().accepts_form(form) {
            return Err(IgesError::InvalidForm {
                entity_type,
                form,
                sequence: 0,
            });
        }
        entity.common_mut().form = form;
        Ok(entity)
    }

    /// Construct the entity a Directory Entry describes and read the entry into it
    ///
    /// Types without a dedicated variant become [`NullEntity`] placeholders
    /// that remember the type number they were read as.
    pub fn from_directory(de: &DirectoryEntry) -> Result<Self> {
        let mut entity = if Self::is_supported(de.entity_type) {
            Self::create(de.entity_type, de.form).map_err(|e| match e {
                IgesError::InvalidForm {
                    entity_type, form, ..
                } => IgesError::InvalidForm {
                    entity_type,
                    form,
                    sequence: de.sequence,
                },
                other => other,
            })?
        } else {
            EntityType::Null(NullEntity::placeholder(de.entity_type))
        };
        entity.common_mut().read_directory(de)?;
        Ok(entity)
    }

    pub fn common(&self) -> &EntityCommon {
        self.as_entity().common()
    }

    pub fn common_mut(&mut self) -> &mut EntityCommon {
        self.as_entity_mut().common_mut()
    }

    /// Type number written to the file
    pub fn type_number(&self) -> i32 {
        self.as_entity().type_number()
    }

    /// Type number the entity was read as
    ///
    /// Placeholders for unmodelled types keep the number they were read as,
    /// so this equals [`type_number`](Self::type_number).
    pub fn declared_type(&self) -> i32 {
        self.type_number()
    }

    pub fn state(&self) -> EntityState {
        self.common().state()
    }

    /// Every outgoing pointer with its role
    pub fn links(&self) -> Vec<(PointerRole, Link)> {
        let mut links = self.common().links();
        links.extend(self.as_entity().parameter_links());
        links
    }

    /// Visit every outgoing pointer in place
    pub fn visit_links_mut(&mut self, visit: &mut dyn FnMut(PointerRole, &mut Link)) {
        self.common_mut().visit_links_mut(visit);
        self.as_entity_mut().visit_parameter_links_mut(visit);
    }

    /// Distinct bound targets of outgoing pointers
    pub fn children(&self) -> Vec<Handle> {
        let mut children: Vec<Handle> = Vec::new();
        for (_, link) in self.links() {
            if let Some(handle) = link.handle() {
                if !children.contains(&handle) {
                    children.push(handle);
                }
            }
        }
        children
    }

    /// Null every outgoing pointer to `child`; returns the edges removed
    pub fn unlink(&mut self, child: Handle) -> usize {
        self.common_mut().unlink(child) + self.as_entity_mut().unlink_parameters(child)
    }

    /// Parse this entity's Parameter Data
    ///
    /// `data` is the concatenation of the 64 data columns of every PD line
    /// belonging to the entity. Linear fields are rescaled when the load
    /// converts units.
    pub fn read_parameters(&mut self, data: &str, global: &GlobalData) -> Result<()> {
        let result = self.read_parameters_inner(data, global);
        let common = self.common_mut();
        match result {
            Ok(()) => common.set_state(EntityState::ParametersRead),
            Err(_) => {
                common.associativities.clear();
                common.properties.clear();
                common.comments.clear();
                common.set_state(EntityState::Invalid);
            }
        }
        result
    }

    fn read_parameters_inner(&mut self, data: &str, global: &GlobalData) -> Result<()> {
        let sequence = self.common().sequence;
        let declared = self.declared_type();
        let mut reader = ParameterReader::new(data, global.parameter_delimiter, global.record_delimiter)
            .with_context(sequence, PARAMETER_DATA_WIDTH);

        let found = reader.read_int("entity type")?;
        if found != declared {
            return Err(IgesError::Parse(format!(
                "DE {}: Parameter Data is for entity type {}, expected {}",
                sequence, found, declared
            )));
        }

        let entity = self.as_entity_mut();
        entity.read_parameters(&mut reader)?;
        if !reader.is_end_of_record() {
            read_extras(&mut reader, entity.common_mut())?;
        }
        entity.common_mut().comments = reader.read_comments();

        if global.convert {
            entity.rescale(global.conversion_factor);
        }
        Ok(())
    }

    /// Format this entity's Parameter Data starting at `*pd_sequence`
    ///
    /// On success the counter moves past the records produced and the
    /// parameter line count is updated. On failure nothing is produced, the
    /// counter is untouched and the entity becomes invalid.
    pub fn format(&mut self, ctx: &FormatContext<'_>, pd_sequence: &mut i32) -> Result<Vec<Record>> {
        let mut next = *pd_sequence;
        match self.format_records(ctx, &mut next) {
            Ok(records) => {
                let common = self.common_mut();
                common.parameter_line_count = next - *pd_sequence;
                common.set_state(EntityState::Formatted);
                *pd_sequence = next;
                Ok(records)
            }
            Err(e) => {
                self.common_mut().set_state(EntityState::Invalid);
                Err(e)
            }
        }
    }

    fn format_records(&self, ctx: &FormatContext<'_>, sequence: &mut i32) -> Result<Vec<Record>> {
        let entity = self.as_entity();
        let common = entity.common();
        let mut packer = RecordPacker::new(
            Section::Parameter,
            PARAMETER_DATA_WIDTH,
            ctx.global.parameter_delimiter,
            ctx.global.record_delimiter,
            ctx.global.min_resolution,
        )
        .with_back_pointer(common.sequence);

        packer.push_int(entity.type_number());
        entity.write_parameters(&mut packer, ctx)?;

        if !common.associativities.is_empty() || !common.properties.is_empty() {
            write_link_list(&mut packer, ctx, &common.associativities)?;
            if !common.properties.is_empty() {
                write_link_list(&mut packer, ctx, &common.properties)?;
            }
        }
        for comment in &common.comments {
            packer.push_comment(comment);
        }
        packer.finish(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_forms() {
        assert!(EntityType::create(110, 2).is_ok());
        assert!(matches!(
            EntityType::create(110, 3),
            Err(IgesError::InvalidForm {
                entity_type: 110,
                form: 3,
                ..
            })
        ));
        assert!(EntityType::create(124, 12).is_ok());
        assert!(EntityType::create(124, 2).is_err());
        assert!(EntityType::create(0, 42).is_ok());
        assert!(matches!(
            EntityType::create(128, 0),
            Err(IgesError::UnsupportedEntityType(128))
        ));
    }

    #[test]
    fn test_invalid_form_reports_sequence() {
        let de = DirectoryEntry {
            entity_type: 110,
            form: 7,
            sequence: 21,
            ..Default::default()
        };
        let err = EntityType::from_directory(&de).unwrap_err();
        assert!(matches!(err, IgesError::InvalidForm { sequence: 21, .. }));
    }

    #[test]
    fn test_unsupported_type_becomes_placeholder() {
        let de = DirectoryEntry {
            entity_type: 126,
            sequence: 5,
            ..Default::default()
        };
        let entity = EntityType::from_directory(&de).unwrap();
        assert_eq!(entity.type_number(), 126);
        assert_eq!(entity.declared_type(), 126);
        assert_eq!(entity.as_entity().type_name(), "Unsupported");
    }

    #[test]
    fn test_reference_counting() {
        let mut common = EntityCommon::new();
        let a = Handle::new(1);
        let b = Handle::new(2);
        common.add_reference(a);
        common.add_reference(a);
        common.add_reference(b);
        assert_eq!(common.ref_count(), 2);
        assert_eq!(common.edge_count(a), 2);

        assert!(common.del_reference(a));
        assert_eq!(common.ref_count(), 2);
        assert!(common.del_reference(a));
        assert_eq!(common.ref_count(), 1);
        assert!(!common.del_reference(a));
        assert!(common.del_reference(b));
        assert!(common.is_orphaned());

        common.status.subordinate = Subordinate::Independent;
        assert!(!common.is_orphaned());
    }

    #[test]
    fn test_read_directory_pointer_signs() {
        let de = DirectoryEntry {
            entity_type: 110,
            structure: -9,
            line_font: 2,
            level: -11,
            transform: 13,
            color: -15,
            sequence: 1,
            ..Default::default()
        };
        let mut common = EntityCommon::new();
        common.read_directory(&de).unwrap();
        assert_eq!(common.structure, Some(Link::Pending(9)));
        assert_eq!(common.line_font, ValueOrEntity::Value(2));
        assert_eq!(common.level, ValueOrEntity::Entity(Link::Pending(11)));
        assert_eq!(common.transform, Some(Link::Pending(13)));
        assert_eq!(common.color, ValueOrEntity::Entity(Link::Pending(15)));
        assert_eq!(common.state(), EntityState::DirectoryRead);
    }

    #[test]
    fn test_invalid_color_number() {
        let de = DirectoryEntry {
            entity_type: 110,
            color: 42,
            sequence: 3,
            ..Default::default()
        };
        assert!(EntityCommon::new().read_directory(&de).is_err());
    }

    #[test]
    fn test_unlink_clears_every_role() {
        let child = Handle::new(7);
        let mut common = EntityCommon::new();
        common.transform = Some(Link::Bound(child));
        common.color = ValueOrEntity::Entity(Link::Bound(child));
        common.properties = vec![Link::Bound(child), Link::Bound(Handle::new(8))];
        assert_eq!(common.unlink(child), 3);
        assert_eq!(common.transform, None);
        assert_eq!(common.color, ValueOrEntity::Value(ColorNumber::NoColor));
        assert_eq!(common.properties, vec![Link::Bound(Handle::new(8))]);
    }

    #[test]
    fn test_extras_and_comments() {
        let global = GlobalData::default();
        let mut entity = EntityType::create(110, 0).unwrap();
        entity.common_mut().sequence = 1;
        let data = format!("{:<64}{:<64}", "110,0.,0.,0.,1.,1.,1.,2,3,5,1,7;", "a comment");
        entity.read_parameters(&data, &global).unwrap();
        let common = entity.common();
        assert_eq!(common.associativities, vec![Link::Pending(3), Link::Pending(5)]);
        assert_eq!(common.properties, vec![Link::Pending(7)]);
        assert_eq!(common.comments, vec!["a comment".to_string()]);
        assert_eq!(common.state(), EntityState::ParametersRead);
    }

    #[test]
    fn test_wrong_type_in_parameters() {
        let global = GlobalData::default();
        let mut entity = EntityType::create(116, 0).unwrap();
        entity.common_mut().sequence = 9;
        let err = entity.read_parameters("110,0.,0.,0.;", &global).unwrap_err();
        assert!(err.to_string().contains("DE 9"));
        assert_eq!(entity.state(), EntityState::Invalid);
    }

    #[test]
    fn test_conversion_applied_on_read() {
        let global = GlobalData {
            convert: true,
            conversion_factor: 25.4,
            ..Default::default()
        };
        let mut entity = EntityType::create(110, 0).unwrap();
        entity.read_parameters("110,1.,0.,0.,0.,2.,0.;", &global).unwrap();
        match entity {
            EntityType::Line(line) => {
                assert_eq!(line.start, Vector3::new(25.4, 0.0, 0.0));
                assert_eq!(line.end, Vector3::new(0.0, 50.8, 0.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
