//! glTF-flavored document model consumed and produced by the technique
//! compiler.
//!
//! The model is deliberately narrow: materials, skins, and the extension
//! containers the compiler reads and appends to. Mesh/buffer/accessor
//! decoding happens upstream; the compiler receives per-material vertex
//! layout facts through [`crate::technique::PrimitiveInfo`] instead.
//!
//! Compilation only ever appends to a document — materials gain a
//! technique reference, the document gains the technique extension
//! container and its `extensionsUsed`/`extensionsRequired` entries.

use serde::{Deserialize, Serialize};

use crate::errors::{GaiaError, Result};
use crate::technique::TechniquesWebgl;

/// Name of the technique extension appended by the compiler.
pub const TECHNIQUES_EXTENSION: &str = "KHR_techniques_webgl";
/// Name of the specular-glossiness material extension.
pub const SPEC_GLOSS_EXTENSION: &str = "KHR_materials_pbrSpecularGlossiness";
/// Name of the unlit material extension.
pub const UNLIT_EXTENSION: &str = "KHR_materials_unlit";

/// How the alpha channel of the base color is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

/// A reference to a texture plus the texcoord set it samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    pub index: usize,
    #[serde(default)]
    pub tex_coord: u32,
}

impl TextureInfo {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            tex_coord: 0,
        }
    }
}

/// A material parameter value, as extracted into the technique value table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniformValue {
    Scalar(f64),
    Vec3([f64; 3]),
    Vec4([f64; 4]),
    Texture(TextureInfo),
}

/// The metallic-roughness parameter block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PbrMetallicRoughness {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_color_factor: Option<[f64; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_color_texture: Option<TextureInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metallic_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roughness_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metallic_roughness_texture: Option<TextureInfo>,
}

impl PbrMetallicRoughness {
    /// Set parameters in declaration order, under their glTF names.
    pub fn parameters(&self) -> impl Iterator<Item = (&'static str, UniformValue)> {
        [
            self.base_color_factor
                .map(|v| ("baseColorFactor", UniformValue::Vec4(v))),
            self.base_color_texture
                .map(|v| ("baseColorTexture", UniformValue::Texture(v))),
            self.metallic_factor
                .map(|v| ("metallicFactor", UniformValue::Scalar(v))),
            self.roughness_factor
                .map(|v| ("roughnessFactor", UniformValue::Scalar(v))),
            self.metallic_roughness_texture
                .map(|v| ("metallicRoughnessTexture", UniformValue::Texture(v))),
        ]
        .into_iter()
        .flatten()
    }
}

/// The specular-glossiness parameter block
/// (`KHR_materials_pbrSpecularGlossiness`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PbrSpecularGlossiness {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diffuse_factor: Option<[f64; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diffuse_texture: Option<TextureInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specular_factor: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glossiness_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specular_glossiness_texture: Option<TextureInfo>,
}

impl PbrSpecularGlossiness {
    /// Set parameters in declaration order, under their glTF names.
    pub fn parameters(&self) -> impl Iterator<Item = (&'static str, UniformValue)> {
        [
            self.diffuse_factor
                .map(|v| ("diffuseFactor", UniformValue::Vec4(v))),
            self.diffuse_texture
                .map(|v| ("diffuseTexture", UniformValue::Texture(v))),
            self.specular_factor
                .map(|v| ("specularFactor", UniformValue::Vec3(v))),
            self.glossiness_factor
                .map(|v| ("glossinessFactor", UniformValue::Scalar(v))),
            self.specular_glossiness_texture
                .map(|v| ("specularGlossinessTexture", UniformValue::Texture(v))),
        ]
        .into_iter()
        .flatten()
    }
}

/// Marker payload for `KHR_materials_unlit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlitMaterial {}

/// The compiled technique reference stored on a material.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialTechnique {
    /// Index into the document's technique table.
    pub technique: usize,
    /// Uniform name to extracted value.
    pub values: std::collections::BTreeMap<String, UniformValue>,
}

/// Extension blocks attached to one material.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialExtensions {
    #[serde(
        rename = "KHR_materials_pbrSpecularGlossiness",
        skip_serializing_if = "Option::is_none"
    )]
    pub pbr_specular_glossiness: Option<PbrSpecularGlossiness>,
    #[serde(rename = "KHR_materials_unlit", skip_serializing_if = "Option::is_none")]
    pub unlit: Option<UnlitMaterial>,
    #[serde(rename = "KHR_techniques_webgl", skip_serializing_if = "Option::is_none")]
    pub techniques: Option<MaterialTechnique>,
}

impl MaterialExtensions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pbr_specular_glossiness.is_none() && self.unlit.is_none() && self.techniques.is_none()
    }
}

/// A material description. Immutable during a compile call except for the
/// technique reference the compiler appends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Material {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_texture: Option<TextureInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occlusion_texture: Option<TextureInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emissive_texture: Option<TextureInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emissive_factor: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha_mode: Option<AlphaMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha_cutoff: Option<f64>,
    pub double_sided: bool,
    #[serde(skip_serializing_if = "MaterialExtensions::is_empty")]
    pub extensions: MaterialExtensions,
}

impl Material {
    /// True when the specular-glossiness extension overrides the
    /// metallic-roughness block.
    #[must_use]
    pub fn is_specular_glossiness(&self) -> bool {
        self.extensions.pbr_specular_glossiness.is_some()
    }

    /// True when the unlit extension disables lighting.
    #[must_use]
    pub fn is_unlit(&self) -> bool {
        self.extensions.unlit.is_some()
    }

    /// Set top-level parameters whose glTF names contain `Texture` or
    /// `Factor`, in declaration order.
    pub fn texture_and_factor_parameters(
        &self,
    ) -> impl Iterator<Item = (&'static str, UniformValue)> {
        [
            self.normal_texture
                .map(|v| ("normalTexture", UniformValue::Texture(v))),
            self.occlusion_texture
                .map(|v| ("occlusionTexture", UniformValue::Texture(v))),
            self.emissive_texture
                .map(|v| ("emissiveTexture", UniformValue::Texture(v))),
            self.emissive_factor
                .map(|v| ("emissiveFactor", UniformValue::Vec3(v))),
        ]
        .into_iter()
        .flatten()
    }
}

/// A skin; only the joint list matters to shader generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skin {
    pub joints: Vec<usize>,
}

/// Document-level extension container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentExtensions {
    #[serde(rename = "KHR_techniques_webgl", skip_serializing_if = "Option::is_none")]
    pub techniques: Option<TechniquesWebgl>,
}

impl DocumentExtensions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.techniques.is_none()
    }
}

/// The in-memory document the compiler transforms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub materials: Vec<Material>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skins: Vec<Skin>,
    #[serde(skip_serializing_if = "DocumentExtensions::is_empty")]
    pub extensions: DocumentExtensions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extensions_used: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extensions_required: Vec<String>,
}

impl Document {
    /// True when `name` appears in the document's `extensionsUsed` list or
    /// the typed extension container already holds its payload.
    #[must_use]
    pub fn has_extension(&self, name: &str) -> bool {
        if self.extensions_used.iter().any(|used| used == name) {
            return true;
        }
        name == TECHNIQUES_EXTENSION && self.extensions.techniques.is_some()
    }

    /// Records `name` in `extensionsUsed`, once.
    pub fn declare_extension_used(&mut self, name: &str) {
        if !self.extensions_used.iter().any(|used| used == name) {
            self.extensions_used.push(name.to_string());
        }
    }

    /// Records `name` in `extensionsRequired`, once.
    pub fn declare_extension_required(&mut self, name: &str) {
        if !self.extensions_required.iter().any(|required| required == name) {
            self.extensions_required.push(name.to_string());
        }
    }

    pub fn material(&self, index: usize) -> Result<&Material> {
        self.materials
            .get(index)
            .ok_or(GaiaError::MaterialIndexOutOfBounds {
                index,
                count: self.materials.len(),
            })
    }

    /// Parses a document from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serializes the document to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
