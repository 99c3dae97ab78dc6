//! Test document builders.
//!
//! `IgesFileBuilder` writes raw IGES text directly, so tests can feed the
//! reader files no conforming writer would produce (forbidden pointers,
//! dangling sequence numbers, odd units). `create_sample_document()` builds a
//! model that exercises every supported entity type and pointer role.

#![allow(dead_code)]

use igesrust::entities::*;
use igesrust::types::{ColorNumber, Matrix3, Transform, Vector3};
use igesrust::{Handle, IgesDocument};

/// One entity of a raw file: Directory Entry fields plus Parameter Data text
#[derive(Debug, Clone)]
pub struct RawEntity {
    pub entity_type: i32,
    pub form: i32,
    pub structure: i32,
    pub transform: i32,
    pub color: i32,
    pub status: String,
    pub label: String,
    pub subscript: i32,
    pub parameters: String,
}

impl RawEntity {
    /// `parameters` is the full PD text, entity type and record delimiter included.
    pub fn new(entity_type: i32, parameters: &str) -> Self {
        Self {
            entity_type,
            form: 0,
            structure: 0,
            transform: 0,
            color: 0,
            status: "00010000".to_string(),
            label: String::new(),
            subscript: 0,
            parameters: parameters.to_string(),
        }
    }

    pub fn form(mut self, form: i32) -> Self {
        self.form = form;
        self
    }

    pub fn structure(mut self, sequence: i32) -> Self {
        self.structure = -sequence;
        self
    }

    pub fn transform(mut self, sequence: i32) -> Self {
        self.transform = sequence;
        self
    }

    pub fn color(mut self, color: i32) -> Self {
        self.color = color;
        self
    }

    pub fn label(mut self, label: &str, subscript: i32) -> Self {
        self.label = label.to_string();
        self.subscript = subscript;
        self
    }

    pub fn independent(mut self) -> Self {
        self.status = "00000000".to_string();
        self
    }
}

/// Builds the text of an IGES file line by line
#[derive(Debug, Clone)]
pub struct IgesFileBuilder {
    unit_flag: i32,
    unit_name: String,
    entities: Vec<RawEntity>,
}

impl IgesFileBuilder {
    pub fn new() -> Self {
        Self {
            unit_flag: 2,
            unit_name: "MM".to_string(),
            entities: Vec::new(),
        }
    }

    pub fn units(mut self, flag: i32, name: &str) -> Self {
        self.unit_flag = flag;
        self.unit_name = name.to_string();
        self
    }

    /// Add an entity; its DE sequence number is `2 * index + 1`.
    pub fn entity(mut self, entity: RawEntity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn build(&self) -> String {
        let global = format!(
            "1H,,1H;,,,,,32,38,6,308,15,,1.,{},{}H{},1,0.,15H20260101.000000,1.E-08,0.,,,11,0,15H20260101.000000;",
            self.unit_flag,
            self.unit_name.len(),
            self.unit_name
        );
        let global_lines = chunks(&global, 72);

        let mut directory = Vec::new();
        let mut parameter = Vec::new();
        for (index, entity) in self.entities.iter().enumerate() {
            let sequence = 2 * index as i32 + 1;
            let first_pd = parameter.len() + 1;
            let pd_lines = chunks(&entity.parameters, 64);
            for data in &pd_lines {
                parameter.push(format!("{:<64}{:>8}", data, sequence));
            }
            directory.push(format!(
                "{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}",
                entity.entity_type, first_pd, entity.structure, 0, 0, 0, entity.transform, 0, entity.status
            ));
            directory.push(format!(
                "{:>8}{:>8}{:>8}{:>8}{:>8}{:16}{:>8}{:>8}",
                entity.entity_type,
                0,
                entity.color,
                pd_lines.len(),
                entity.form,
                "",
                entity.label,
                entity.subscript
            ));
        }

        let mut text = String::new();
        text += &record("raw test file", 'S', 1);
        for (i, data) in global_lines.iter().enumerate() {
            text += &record(data, 'G', i + 1);
        }
        for (i, data) in directory.iter().enumerate() {
            text += &record(data, 'D', i + 1);
        }
        for (i, data) in parameter.iter().enumerate() {
            text += &record(data, 'P', i + 1);
        }
        let terminate = format!(
            "S{:07}G{:07}D{:07}P{:07}",
            1,
            global_lines.len(),
            directory.len(),
            parameter.len()
        );
        text += &record(&terminate, 'T', 1);
        text
    }
}

impl Default for IgesFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One 80-column line with its terminator
pub fn record(data: &str, section: char, sequence: usize) -> String {
    format!("{:<72}{}{:>7}\n", data, section, sequence)
}

fn chunks(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

/// Handles of the entities in [`create_sample_document`]
#[derive(Debug, Clone, Copy)]
pub struct SampleHandles {
    pub color: Handle,
    pub matrix: Handle,
    pub line_a: Handle,
    pub line_b: Handle,
    pub curve: Handle,
    pub point: Handle,
    pub definition: Handle,
    pub instance: Handle,
}

/// Create a document using every supported entity type and pointer role.
///
/// Two lines form a composite curve, the first carries a transform and a
/// color definition, and a subfigure definition holds the curve and a point
/// which is placed by a subfigure instance.
pub fn create_sample_document() -> (IgesDocument, SampleHandles) {
    let mut doc = IgesDocument::new();

    let color = doc
        .add_entity(EntityType::ColorDefinition(ColorDefinition {
            name: "ORANGE".to_string(),
            ..ColorDefinition::from_rgb(100.0, 50.0, 0.0)
        }))
        .unwrap();

    let matrix = doc
        .add_entity(EntityType::TransformationMatrix(TransformationMatrix::from_transform(
            Transform::new(Matrix3::rotation_z(std::f64::consts::FRAC_PI_2), Vector3::new(1.0, 2.0, 3.0)),
        )))
        .unwrap();

    let mut first = Line::from_coords(0.0, 0.0, 0.0, 10.0, 0.0, 0.0);
    first.common.label = "EDGE".to_string();
    first.common.subscript = 1;
    let line_a = doc.add_entity(EntityType::Line(first)).unwrap();
    doc.set_transform(line_a, Some(matrix)).unwrap();
    doc.set_color(line_a, Some(color)).unwrap();

    let mut second = Line::from_coords(10.0, 0.0, 0.0, 10.0, 5.0, 0.0);
    second.common.color = ValueOrEntity::Value(ColorNumber::Red);
    second.common.comments = vec!["second edge".to_string()];
    let line_b = doc.add_entity(EntityType::Line(second)).unwrap();

    let curve = doc.add_entity(EntityType::CompositeCurve(CompositeCurve::new())).unwrap();
    doc.add_segment(curve, line_a).unwrap();
    doc.add_segment(curve, line_b).unwrap();

    let point = doc
        .add_entity(EntityType::Point(Point::at(Vector3::new(-1.5, 2.25, 0.0))))
        .unwrap();

    let definition = doc
        .add_entity(EntityType::SubfigureDefinition(SubfigureDefinition::named("BRACKET, A;1")))
        .unwrap();
    doc.add_member(definition, curve).unwrap();
    doc.add_member(definition, point).unwrap();

    let mut placed = SubfigureInstance::new();
    placed.translation = Vector3::new(100.0, 0.0, 0.0);
    placed.scale = 2.0;
    placed.common.status.subordinate = Subordinate::Independent;
    let instance = doc.add_entity(EntityType::SubfigureInstance(placed)).unwrap();
    doc.set_subfigure(instance, definition).unwrap();

    (
        doc,
        SampleHandles {
            color,
            matrix,
            line_a,
            line_b,
            curve,
            point,
            definition,
            instance,
        },
    )
}
