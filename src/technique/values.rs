//! Material value extraction.
//!
//! Flattens a material's declared parameters into the uniform-name → value
//! map stored alongside the technique reference. The active parameter model
//! contributes every set property under a `u_` prefix; top-level `Texture`
//! / `Factor` properties are always included. Later writes win, matching
//! declaration order in the material.

use std::collections::BTreeMap;

use crate::document::{Material, UniformValue};

/// Prefix applied to parameter names when forming uniform names.
pub const UNIFORM_PREFIX: &str = "u_";

/// Extracts the uniform value map for `material`.
///
/// The metallic-roughness block and the specular-glossiness extension are
/// mutually exclusive sources; the extension wins when present.
#[must_use]
pub fn extract(material: &Material) -> BTreeMap<String, UniformValue> {
    let mut values = BTreeMap::new();

    if let Some(spec_gloss) = &material.extensions.pbr_specular_glossiness {
        for (name, value) in spec_gloss.parameters() {
            values.insert(format!("{UNIFORM_PREFIX}{name}"), value);
        }
    } else if let Some(pbr) = &material.pbr_metallic_roughness {
        for (name, value) in pbr.parameters() {
            values.insert(format!("{UNIFORM_PREFIX}{name}"), value);
        }
    }

    for (name, value) in material.texture_and_factor_parameters() {
        values.insert(format!("{UNIFORM_PREFIX}{name}"), value);
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{PbrMetallicRoughness, PbrSpecularGlossiness, TextureInfo};

    #[test]
    fn metallic_roughness_parameters_are_prefixed() {
        let material = Material {
            pbr_metallic_roughness: Some(PbrMetallicRoughness {
                base_color_factor: Some([1.0, 0.0, 0.0, 1.0]),
                roughness_factor: Some(0.25),
                ..Default::default()
            }),
            ..Default::default()
        };
        let values = extract(&material);
        assert_eq!(
            values.get("u_baseColorFactor"),
            Some(&UniformValue::Vec4([1.0, 0.0, 0.0, 1.0]))
        );
        assert_eq!(
            values.get("u_roughnessFactor"),
            Some(&UniformValue::Scalar(0.25))
        );
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn spec_gloss_extension_replaces_metallic_roughness() {
        let material = Material {
            pbr_metallic_roughness: Some(PbrMetallicRoughness {
                base_color_factor: Some([1.0, 1.0, 1.0, 1.0]),
                ..Default::default()
            }),
            extensions: crate::document::MaterialExtensions {
                pbr_specular_glossiness: Some(PbrSpecularGlossiness {
                    diffuse_factor: Some([0.5, 0.5, 0.5, 1.0]),
                    glossiness_factor: Some(0.8),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        let values = extract(&material);
        assert!(values.contains_key("u_diffuseFactor"));
        assert!(values.contains_key("u_glossinessFactor"));
        assert!(!values.contains_key("u_baseColorFactor"));
    }

    #[test]
    fn top_level_texture_and_factor_properties_always_included() {
        let material = Material {
            extensions: crate::document::MaterialExtensions {
                pbr_specular_glossiness: Some(PbrSpecularGlossiness::default()),
                ..Default::default()
            },
            normal_texture: Some(TextureInfo::new(2)),
            emissive_factor: Some([0.1, 0.2, 0.3]),
            ..Default::default()
        };
        let values = extract(&material);
        assert_eq!(
            values.get("u_normalTexture"),
            Some(&UniformValue::Texture(TextureInfo::new(2)))
        );
        assert_eq!(
            values.get("u_emissiveFactor"),
            Some(&UniformValue::Vec3([0.1, 0.2, 0.3]))
        );
    }

    #[test]
    fn empty_material_extracts_nothing() {
        assert!(extract(&Material::default()).is_empty());
    }
}
