//! Techniques: compiled shader programs plus their attribute/uniform
//! binding tables.
//!
//! A technique is the output of compiling one material against the vertex
//! layout facts of the primitives that use it. Techniques, their shader
//! sources, and their programs live in a [`TechniquesWebgl`] container
//! appended to the document; one technique is generated per material and
//! referenced from the material's extension block.

pub mod compiler;
pub mod shader_builder;
pub mod values;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::errors::{GaiaError, Result};

pub use compiler::{CompileOptions, process_materials};
pub use shader_builder::ShaderBuilder;

bitflags! {
    /// Which optional vertex attributes a primitive carries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct VertexLayout: u32 {
        const NORMALS       = 1 << 0;
        const TANGENTS      = 1 << 1;
        const TEXCOORDS     = 1 << 2;
        const VERTEX_COLORS = 1 << 3;
    }
}

/// glTF accessor types, as used for joint/weight attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessorType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AccessorType {
    #[must_use]
    pub const fn component_count(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    #[must_use]
    pub const fn is_matrix(self) -> bool {
        matches!(self, Self::Mat2 | Self::Mat3 | Self::Mat4)
    }

    #[must_use]
    pub const fn glsl_name(self) -> &'static str {
        match self {
            Self::Scalar => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Mat2 => "mat2",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
        }
    }
}

/// Skinning facts for a primitive: the encoding of the joint/weight
/// attributes and how many joints the skin drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinningInfo {
    /// Accessor type of the joint and weight attributes. Vector types carry
    /// one influence per component; matrix types carry one per element.
    pub attribute_type: AccessorType,
    /// Number of joints in the skin.
    pub joint_count: usize,
}

/// Which attributes one morph target displaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MorphTarget {
    pub position: bool,
    pub normal: bool,
    pub tangent: bool,
}

/// Per-geometry facts derived from the vertex layout of the primitives
/// sharing a material. Drives which shader code paths are emitted.
///
/// The compiler assumes internal consistency — for example that a skinned
/// layout actually has joint and weight attributes. Handing it
/// contradictory facts produces shaders with undefined behavior; this is a
/// documented precondition, not a checked error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveInfo {
    pub layout: VertexLayout,
    pub skinning: Option<SkinningInfo>,
    pub morph_targets: Vec<MorphTarget>,
}

impl PrimitiveInfo {
    #[must_use]
    pub fn has_normals(&self) -> bool {
        self.layout.contains(VertexLayout::NORMALS)
    }

    #[must_use]
    pub fn has_tangents(&self) -> bool {
        self.layout.contains(VertexLayout::TANGENTS)
    }

    #[must_use]
    pub fn has_texcoords(&self) -> bool {
        self.layout.contains(VertexLayout::TEXCOORDS)
    }

    #[must_use]
    pub fn has_vertex_colors(&self) -> bool {
        self.layout.contains(VertexLayout::VERTEX_COLORS)
    }

    /// True when joint data is present and the skin drives at least one
    /// joint.
    #[must_use]
    pub fn is_skinned(&self) -> bool {
        self.skinning.is_some_and(|info| info.joint_count > 0)
    }
}

/// GLSL uniform types emitted into technique tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UniformType {
    Float,
    Int,
    FloatVec2,
    FloatVec3,
    FloatVec4,
    FloatMat3,
    FloatMat4,
    #[serde(rename = "SAMPLER_2D")]
    Sampler2d,
}

impl UniformType {
    #[must_use]
    pub const fn glsl_name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::FloatVec2 => "vec2",
            Self::FloatVec3 => "vec3",
            Self::FloatVec4 => "vec4",
            Self::FloatMat3 => "mat3",
            Self::FloatMat4 => "mat4",
            Self::Sampler2d => "sampler2D",
        }
    }

    #[must_use]
    pub const fn is_matrix(self) -> bool {
        matches!(self, Self::FloatMat3 | Self::FloatMat4)
    }
}

/// Well-known uniform semantics resolved by the runtime each draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UniformSemantic {
    #[serde(rename = "MODELVIEW")]
    ModelView,
    Projection,
    #[serde(rename = "MODELVIEWINVERSETRANSPOSE")]
    ModelViewInverseTranspose,
    #[serde(rename = "JOINTMATRIX")]
    JointMatrix,
    #[serde(rename = "MORPHWEIGHTS")]
    MorphWeights,
    #[serde(rename = "ALPHACUTOFF")]
    AlphaCutoff,
}

/// One entry in a technique's uniform table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueUniform {
    #[serde(rename = "type")]
    pub ty: UniformType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic: Option<UniformSemantic>,
    /// Array length for uniform arrays (joint matrices, morph weights).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl TechniqueUniform {
    #[must_use]
    pub const fn new(ty: UniformType) -> Self {
        Self {
            ty,
            semantic: None,
            count: None,
        }
    }

    #[must_use]
    pub const fn with_semantic(ty: UniformType, semantic: UniformSemantic) -> Self {
        Self {
            ty,
            semantic: Some(semantic),
            count: None,
        }
    }
}

/// One entry in a technique's attribute table; the semantic names the
/// vertex stream bound to the attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueAttribute {
    pub semantic: String,
}

/// A compiled technique: ordered attribute and uniform tables plus the
/// program holding the generated shader pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    pub program: usize,
    #[serde(with = "ordered_table")]
    pub attributes: Vec<(String, TechniqueAttribute)>,
    #[serde(with = "ordered_table")]
    pub uniforms: Vec<(String, TechniqueUniform)>,
}

impl Technique {
    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<&TechniqueUniform> {
        self.uniforms
            .iter()
            .find(|(uniform_name, _)| uniform_name == name)
            .map(|(_, uniform)| uniform)
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&TechniqueAttribute> {
        self.attributes
            .iter()
            .find(|(attribute_name, _)| attribute_name == name)
            .map(|(_, attribute)| attribute)
    }
}

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// A generated shader source record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shader {
    pub stage: ShaderStage,
    pub source: String,
    /// xxh3 of `source`, used to share identical records.
    pub hash: u64,
}

/// A vertex/fragment shader pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub vertex_shader: usize,
    pub fragment_shader: usize,
}

/// The document-level technique extension container. The compiler only
/// appends entries; nothing is ever removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechniquesWebgl {
    pub programs: Vec<Program>,
    pub shaders: Vec<Shader>,
    pub techniques: Vec<Technique>,
}

impl TechniquesWebgl {
    /// Appends a shader record, reusing an existing record with identical
    /// stage and source. Returns the record index.
    pub fn add_shader(&mut self, stage: ShaderStage, source: String) -> usize {
        let hash = xxh3_64(source.as_bytes());
        if let Some(index) = self
            .shaders
            .iter()
            .position(|shader| shader.stage == stage && shader.hash == hash)
        {
            return index;
        }
        self.shaders.push(Shader {
            stage,
            source,
            hash,
        });
        self.shaders.len() - 1
    }

    pub fn add_program(&mut self, program: Program) -> usize {
        self.programs.push(program);
        self.programs.len() - 1
    }

    pub fn add_technique(&mut self, technique: Technique) -> usize {
        self.techniques.push(technique);
        self.techniques.len() - 1
    }

    pub fn technique(&self, index: usize) -> Result<&Technique> {
        self.techniques
            .get(index)
            .ok_or(GaiaError::TechniqueIndexOutOfBounds(index))
    }
}

/// Serializes `Vec<(String, T)>` tables as JSON maps while preserving
/// insertion order in memory.
mod ordered_table {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S, T>(entries: &[(String, T)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        struct TableVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for TableVisitor<T> {
            type Value = Vec<(String, T)>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of named entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(TableVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_shader_dedups_identical_sources() {
        let mut container = TechniquesWebgl::default();
        let a = container.add_shader(ShaderStage::Vertex, "void main() {}".to_string());
        let b = container.add_shader(ShaderStage::Vertex, "void main() {}".to_string());
        let c = container.add_shader(ShaderStage::Fragment, "void main() {}".to_string());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(container.shaders.len(), 2);
    }

    #[test]
    fn technique_tables_serialize_as_maps() {
        let technique = Technique {
            program: 0,
            attributes: vec![(
                "a_position".to_string(),
                TechniqueAttribute {
                    semantic: "POSITION".to_string(),
                },
            )],
            uniforms: vec![(
                "u_modelViewMatrix".to_string(),
                TechniqueUniform::with_semantic(UniformType::FloatMat4, UniformSemantic::ModelView),
            )],
        };
        let json = serde_json::to_string(&technique).unwrap();
        assert!(json.contains("\"a_position\":{\"semantic\":\"POSITION\"}"));
        assert!(json.contains("\"semantic\":\"MODELVIEW\""));
        let parsed: Technique = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, technique);
    }

    #[test]
    fn matrix_weight_component_count_has_integer_root() {
        let info = SkinningInfo {
            attribute_type: AccessorType::Mat4,
            joint_count: 12,
        };
        assert!(info.attribute_type.is_matrix());
        assert_eq!(
            (info.attribute_type.component_count() as f64).sqrt() as usize,
            4
        );
    }
}
