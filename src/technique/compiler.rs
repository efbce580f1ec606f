//! PBR technique compilation.
//!
//! Translates each material in a document into a vertex/fragment GLSL pair
//! plus attribute and uniform binding tables, appended to the document's
//! technique extension container. Compilation is a pure function of the
//! material description and the vertex-layout facts in
//! [`PrimitiveInfo`]; running it twice is a no-op because the extension
//! declaration is checked up front.
//!
//! Generated shaders reference `gaia_`-prefixed built-in uniforms (model
//! matrix, sun direction, environment cube map, BRDF lookup texture,
//! rotation helpers). Those are declared by the runtime's shader preamble,
//! not by the generated source.

use std::collections::BTreeMap;

use log::debug;
use rustc_hash::FxHashMap;

use crate::document::{
    AlphaMode, Document, Material, MaterialTechnique, TECHNIQUES_EXTENSION, UniformValue,
};

use super::shader_builder::ShaderBuilder;
use super::values;
use super::{
    PrimitiveInfo, Program, ShaderStage, Technique, TechniqueAttribute, TechniqueUniform,
    TechniquesWebgl, UniformSemantic, UniformType,
};

/// Options controlling a compile pass.
#[derive(Debug, Default)]
pub struct CompileOptions {
    /// Vertex-layout facts per material index. Materials without an entry
    /// compile as position-only geometry.
    pub primitive_info: FxHashMap<usize, PrimitiveInfo>,
    /// Emit the per-feature batch id attribute.
    pub add_batch_id: bool,
    /// Uniform names forced into the vertex stage regardless of type.
    pub vertex_stage_uniforms: Vec<String>,
}

/// Compiles techniques for every material in `document`.
///
/// Returns `false` without touching the document when it already declares
/// the technique extension or has no materials.
pub fn process_materials(document: &mut Document, options: &CompileOptions) -> bool {
    if document.has_extension(TECHNIQUES_EXTENSION) {
        debug!("document already declares {TECHNIQUES_EXTENSION}; skipping compile");
        return false;
    }
    if document.materials.is_empty() {
        return false;
    }

    let default_joint_count = document.skins.first().map_or(0, |skin| skin.joints.len());

    let mut container = TechniquesWebgl::default();
    let mut references = Vec::with_capacity(document.materials.len());
    for (index, material) in document.materials.iter().enumerate() {
        let values = values::extract(material);
        let technique = generate_technique(
            &mut container,
            material,
            options.primitive_info.get(&index),
            &values,
            default_joint_count,
            options,
        );
        debug!(
            "compiled technique {technique} for material {index} ({} values)",
            values.len()
        );
        references.push(MaterialTechnique { technique, values });
    }

    for (material, reference) in document.materials.iter_mut().zip(references) {
        material.extensions.techniques = Some(reference);
    }
    document.extensions.techniques = Some(container);
    document.declare_extension_used(TECHNIQUES_EXTENSION);
    document.declare_extension_required(TECHNIQUES_EXTENSION);
    true
}

/// Uniform type for a generated material uniform, by name first and value
/// shape as the fallback for names outside the PBR parameter set.
fn uniform_type_for(name: &str, value: &UniformValue) -> UniformType {
    match name {
        "u_baseColorFactor" | "u_diffuseFactor" => UniformType::FloatVec4,
        "u_metallicFactor" | "u_roughnessFactor" | "u_glossinessFactor" => UniformType::Float,
        "u_emissiveFactor" | "u_specularFactor" => UniformType::FloatVec3,
        "u_baseColorTexture" | "u_metallicRoughnessTexture" | "u_normalTexture"
        | "u_occlusionTexture" | "u_emissiveTexture" | "u_diffuseTexture"
        | "u_specularGlossinessTexture" => UniformType::Sampler2d,
        _ => match value {
            UniformValue::Scalar(_) => UniformType::Float,
            UniformValue::Vec3(_) => UniformType::FloatVec3,
            UniformValue::Vec4(_) => UniformType::FloatVec4,
            UniformValue::Texture(_) => UniformType::Sampler2d,
        },
    }
}

fn generate_technique(
    container: &mut TechniquesWebgl,
    material: &Material,
    primitive_info: Option<&PrimitiveInfo>,
    values: &BTreeMap<String, UniformValue>,
    default_joint_count: usize,
    options: &CompileOptions,
) -> usize {
    let use_spec_gloss = material.is_specular_glossiness();
    let is_unlit = material.is_unlit();

    let default_info = PrimitiveInfo::default();
    let info = primitive_info.unwrap_or(&default_info);

    let mut has_normals = info.has_normals();
    let mut has_tangents = info.has_tangents();
    let has_texcoords = info.has_texcoords();
    let has_vertex_colors = info.has_vertex_colors();
    let morph_targets = &info.morph_targets;
    let has_morph_targets = !morph_targets.is_empty();

    let skinning = info.skinning;
    let joint_count = skinning.map_or(0, |skin| {
        if skin.joint_count > 0 {
            skin.joint_count
        } else {
            default_joint_count
        }
    });
    let has_skinning = skinning.is_some() && joint_count > 0;

    // Lighting inputs are meaningless for unlit materials.
    if is_unlit {
        has_normals = false;
        has_tangents = false;
    }

    // ------------------------------------------------------------------
    // Uniform table
    // ------------------------------------------------------------------
    let mut uniforms: Vec<(String, TechniqueUniform)> = vec![
        (
            "u_modelViewMatrix".to_string(),
            TechniqueUniform::with_semantic(UniformType::FloatMat4, UniformSemantic::ModelView),
        ),
        (
            "u_projectionMatrix".to_string(),
            TechniqueUniform::with_semantic(UniformType::FloatMat4, UniformSemantic::Projection),
        ),
    ];
    if has_normals {
        uniforms.push((
            "u_normalMatrix".to_string(),
            TechniqueUniform::with_semantic(
                UniformType::FloatMat3,
                UniformSemantic::ModelViewInverseTranspose,
            ),
        ));
    }
    if has_skinning {
        uniforms.push((
            "u_jointMatrix".to_string(),
            TechniqueUniform {
                ty: UniformType::FloatMat4,
                semantic: Some(UniformSemantic::JointMatrix),
                count: Some(joint_count),
            },
        ));
    }
    if has_morph_targets {
        uniforms.push((
            "u_morphWeights".to_string(),
            TechniqueUniform {
                ty: UniformType::Float,
                semantic: Some(UniformSemantic::MorphWeights),
                count: Some(morph_targets.len()),
            },
        ));
    }
    if material.alpha_mode == Some(AlphaMode::Mask) {
        uniforms.push((
            "u_alphaCutoff".to_string(),
            TechniqueUniform::with_semantic(UniformType::Float, UniformSemantic::AlphaCutoff),
        ));
    }
    for (name, value) in values {
        uniforms.push((
            name.clone(),
            TechniqueUniform::new(uniform_type_for(name, value)),
        ));
    }

    // ------------------------------------------------------------------
    // Stage split: matrix-typed and morph-weight uniforms feed vertex
    // transforms; everything else is sampled in the fragment stage unless
    // explicitly forced to the vertex stage.
    // ------------------------------------------------------------------
    let mut vertex = ShaderBuilder::new();
    let mut fragment = ShaderBuilder::new();
    for (name, uniform) in &uniforms {
        let vertex_stage = uniform.ty.is_matrix()
            || name == "u_morphWeights"
            || options.vertex_stage_uniforms.iter().any(|n| n == name);
        if vertex_stage {
            vertex.add_uniform(name, uniform.ty.glsl_name(), uniform.count);
        } else {
            fragment.add_uniform(name, uniform.ty.glsl_name(), uniform.count);
        }
    }

    let has_value = |name: &str| values.contains_key(name);
    let texcoord = if has_texcoords { Some("v_texcoord_0") } else { None };

    // ------------------------------------------------------------------
    // Vertex stage
    // ------------------------------------------------------------------
    let mut attributes: Vec<(String, TechniqueAttribute)> = Vec::new();
    let push_attribute = |attributes: &mut Vec<(String, TechniqueAttribute)>,
                          name: &str,
                          semantic: &str| {
        attributes.push((
            name.to_string(),
            TechniqueAttribute {
                semantic: semantic.to_string(),
            },
        ));
    };

    if has_skinning {
        let skin = skinning.expect("has_skinning implies skinning info");
        let component_count = skin.attribute_type.component_count();
        if skin.attribute_type.is_matrix() {
            let order = (component_count as f64).sqrt() as usize;
            for i in 0..order {
                for j in 0..order {
                    let term = format!("a_weight[{i}][{j}] * u_jointMatrix[int(a_joint[{i}][{j}])];");
                    if i == 0 && j == 0 {
                        vertex.add_statement(&format!("mat4 skinMatrix = {term}"));
                    } else {
                        vertex.add_statement(&format!("skinMatrix += {term}"));
                    }
                }
            }
        } else {
            for i in 0..component_count {
                let term = format!("a_weight[{i}] * u_jointMatrix[int(a_joint[{i}])];");
                if i == 0 {
                    vertex.add_statement(&format!("mat4 skinMatrix = {term}"));
                } else {
                    vertex.add_statement(&format!("skinMatrix += {term}"));
                }
            }
        }
    }

    push_attribute(&mut attributes, "a_position", "POSITION");
    vertex.add_attribute("a_position", "vec3");
    if has_normals {
        vertex.add_varying("v_positionEC", "vec3");
        vertex.add_varying("v_positionWC", "vec3");
    }

    // Morph target weighting
    vertex.add_statement("vec3 weightedPosition = a_position;");
    if has_normals {
        vertex.add_statement("vec3 weightedNormal = a_normal;");
    }
    if has_tangents {
        vertex.add_statement("vec4 weightedTangent = a_tangent;");
    }
    for (k, target) in morph_targets.iter().enumerate() {
        if target.position {
            let name = format!("a_POSITION_{k}");
            push_attribute(&mut attributes, &name, &format!("POSITION_{k}"));
            vertex.add_attribute(&name, "vec3");
            vertex.add_statement(&format!("weightedPosition += u_morphWeights[{k}] * {name};"));
        }
        if has_normals && target.normal {
            let name = format!("a_NORMAL_{k}");
            push_attribute(&mut attributes, &name, &format!("NORMAL_{k}"));
            vertex.add_attribute(&name, "vec3");
            vertex.add_statement(&format!("weightedNormal += u_morphWeights[{k}] * {name};"));
        }
        if has_tangents && target.tangent {
            let name = format!("a_TANGENT_{k}");
            push_attribute(&mut attributes, &name, &format!("TANGENT_{k}"));
            vertex.add_attribute(&name, "vec3");
            vertex.add_statement(&format!("weightedTangent.xyz += u_morphWeights[{k}] * {name};"));
        }
    }

    // Position: skin the morphed position, then transform to eye space.
    if has_skinning {
        vertex.add_statement("vec4 position = skinMatrix * vec4(weightedPosition, 1.0);");
    } else {
        vertex.add_statement("vec4 position = vec4(weightedPosition, 1.0);");
    }
    if has_normals {
        vertex.add_statement("v_positionWC = (gaia_model * position).xyz;");
    }
    vertex.add_statement("position = u_modelViewMatrix * position;");
    if has_normals {
        vertex.add_statement("v_positionEC = position.xyz;");
    }
    vertex.add_statement("gl_Position = u_projectionMatrix * position;");

    if has_normals {
        push_attribute(&mut attributes, "a_normal", "NORMAL");
        vertex.add_attribute("a_normal", "vec3");
        vertex.add_varying("v_normal", "vec3");
        if has_skinning {
            vertex.add_statement("v_normal = u_normalMatrix * mat3(skinMatrix) * weightedNormal;");
        } else {
            vertex.add_statement("v_normal = u_normalMatrix * weightedNormal;");
        }
        fragment.add_varying("v_normal", "vec3");
        fragment.add_varying("v_positionEC", "vec3");
        fragment.add_varying("v_positionWC", "vec3");
    }

    if has_tangents {
        push_attribute(&mut attributes, "a_tangent", "TANGENT");
        vertex.add_attribute("a_tangent", "vec4");
        vertex.add_varying("v_tangent", "vec4");
        vertex.add_statement("v_tangent.xyz = u_normalMatrix * weightedTangent.xyz;");
        vertex.add_statement("v_tangent.w = weightedTangent.w;");
        fragment.add_varying("v_tangent", "vec4");
    }

    if let Some(texcoord) = texcoord {
        push_attribute(&mut attributes, "a_texcoord_0", "TEXCOORD_0");
        vertex.add_attribute("a_texcoord_0", "vec2");
        vertex.add_varying(texcoord, "vec2");
        vertex.add_statement(&format!("{texcoord} = a_texcoord_0;"));
        fragment.add_varying(texcoord, "vec2");
    }

    if has_skinning {
        let skin = skinning.expect("has_skinning implies skinning info");
        let attribute_type = skin.attribute_type.glsl_name();
        push_attribute(&mut attributes, "a_joint", "JOINTS_0");
        push_attribute(&mut attributes, "a_weight", "WEIGHTS_0");
        vertex.add_attribute("a_joint", attribute_type);
        vertex.add_attribute("a_weight", attribute_type);
    }

    if has_vertex_colors {
        push_attribute(&mut attributes, "a_vertexColor", "COLOR_0");
        vertex.add_attribute("a_vertexColor", "vec4");
        vertex.add_varying("v_vertexColor", "vec4");
        vertex.add_statement("v_vertexColor = a_vertexColor;");
        fragment.add_varying("v_vertexColor", "vec4");
    }

    if options.add_batch_id {
        push_attribute(&mut attributes, "a_batchId", "_BATCHID");
        vertex.add_attribute("a_batchId", "float");
    }

    // ------------------------------------------------------------------
    // Fragment stage: helper functions
    // ------------------------------------------------------------------
    if has_normals {
        fragment.add_function("const float M_PI = 3.141592653589793;");

        fragment.add_function(
            "vec3 lambertianDiffuse(vec3 diffuseColor)\n\
             {\n\
             \x20   return diffuseColor / M_PI;\n\
             }",
        );
        fragment.add_function(
            "vec3 fresnelSchlick2(vec3 f0, vec3 f90, float VdotH)\n\
             {\n\
             \x20   return f0 + (f90 - f0) * pow(clamp(1.0 - VdotH, 0.0, 1.0), 5.0);\n\
             }",
        );
        fragment.add_function(
            "vec3 fresnelSchlick(float metalness, float VdotH)\n\
             {\n\
             \x20   return metalness + (vec3(1.0) - metalness) * pow(1.0 - VdotH, 5.0);\n\
             }",
        );
        fragment.add_function(
            "float smithVisibilityG1(float NdotV, float roughness)\n\
             {\n\
             \x20   float k = (roughness + 1.0) * (roughness + 1.0) / 8.0;\n\
             \x20   return NdotV / (NdotV * (1.0 - k) + k);\n\
             }",
        );
        fragment.add_function(
            "float smithVisibilityGGX(float roughness, float NdotL, float NdotV)\n\
             {\n\
             \x20   return smithVisibilityG1(NdotL, roughness) * smithVisibilityG1(NdotV, roughness);\n\
             }",
        );
        fragment.add_function(
            "float GGX(float roughness, float NdotH)\n\
             {\n\
             \x20   float roughnessSquared = roughness * roughness;\n\
             \x20   float f = (NdotH * roughnessSquared - NdotH) * NdotH + 1.0;\n\
             \x20   return roughnessSquared / (M_PI * f * f);\n\
             }",
        );
    }

    fragment.add_function(
        "vec3 SRGBtoLINEAR3(vec3 srgbIn)\n\
         {\n\
         \x20   return pow(srgbIn, vec3(2.2));\n\
         }",
    );
    fragment.add_function(
        "vec4 SRGBtoLINEAR4(vec4 srgbIn)\n\
         {\n\
         \x20   vec3 linearOut = pow(srgbIn.rgb, vec3(2.2));\n\
         \x20   return vec4(linearOut, srgbIn.a);\n\
         }",
    );
    fragment.add_function(
        "vec3 LINEARtoSRGB(vec3 linearIn)\n\
         {\n\
         \x20   return pow(linearIn, vec3(1.0/2.2));\n\
         }",
    );

    // ------------------------------------------------------------------
    // Fragment stage: main body
    // ------------------------------------------------------------------
    let normal_texcoord = texcoord.filter(|_| has_value("u_normalTexture"));
    if has_normals {
        fragment.add_statement("vec3 ng = normalize(v_normal);");
        if let Some(texcoord) = normal_texcoord {
            if has_tangents {
                fragment.add_statement("vec3 t = normalize(v_tangent.xyz);");
                fragment.add_statement("vec3 b = normalize(cross(ng, t) * v_tangent.w);");
                fragment.add_statement("mat3 tbn = mat3(t, b, ng);");
                fragment.add_statement(&format!(
                    "vec3 n = texture2D(u_normalTexture, {texcoord}).rgb;"
                ));
                fragment.add_statement("n = normalize(tbn * (2.0 * n - 1.0));");
            } else {
                // Derive tangents from screen-space derivatives when the
                // extension is available; otherwise keep the vertex normal.
                fragment.add_extension(
                    "#ifdef GL_OES_standard_derivatives\n\
                     #extension GL_OES_standard_derivatives : enable\n\
                     #endif",
                );
                fragment.add_directive("#ifdef GL_OES_standard_derivatives");
                fragment.add_statement("vec3 pos_dx = dFdx(v_positionEC);");
                fragment.add_statement("vec3 pos_dy = dFdy(v_positionEC);");
                fragment.add_statement(&format!("vec3 tex_dx = dFdx(vec3({texcoord},0.0));"));
                fragment.add_statement(&format!("vec3 tex_dy = dFdy(vec3({texcoord},0.0));"));
                fragment.add_statement(
                    "vec3 t = (tex_dy.t * pos_dx - tex_dx.t * pos_dy) / (tex_dx.s * tex_dy.t - tex_dy.s * tex_dx.t);",
                );
                fragment.add_statement("t = normalize(t - ng * dot(ng, t));");
                fragment.add_statement("vec3 b = normalize(cross(ng, t));");
                fragment.add_statement("mat3 tbn = mat3(t, b, ng);");
                fragment.add_statement(&format!(
                    "vec3 n = texture2D(u_normalTexture, {texcoord}).rgb;"
                ));
                fragment.add_statement("n = normalize(tbn * (2.0 * n - 1.0));");
                fragment.add_directive("#else");
                fragment.add_statement("vec3 n = ng;");
                fragment.add_directive("#endif");
            }
        } else {
            fragment.add_statement("vec3 n = ng;");
        }
        if material.double_sided {
            fragment.add_statement("if (!gl_FrontFacing)");
            fragment.add_statement("{");
            fragment.add_statement("    n = -n;");
            fragment.add_statement("}");
        }
    }

    // Base color
    if let Some(texcoord) = texcoord.filter(|_| has_value("u_baseColorTexture")) {
        fragment.add_statement(&format!(
            "vec4 baseColorWithAlpha = SRGBtoLINEAR4(texture2D(u_baseColorTexture, {texcoord}));"
        ));
        if has_value("u_baseColorFactor") {
            fragment.add_statement("baseColorWithAlpha *= u_baseColorFactor;");
        }
    } else if has_value("u_baseColorFactor") {
        fragment.add_statement("vec4 baseColorWithAlpha = u_baseColorFactor;");
    } else {
        fragment.add_statement("vec4 baseColorWithAlpha = vec4(1.0);");
    }

    if has_vertex_colors {
        fragment.add_statement("baseColorWithAlpha *= v_vertexColor;");
    }
    fragment.add_statement("vec3 baseColor = baseColorWithAlpha.rgb;");

    if has_normals {
        emit_lighting(&mut fragment, use_spec_gloss, texcoord, &has_value);
    } else {
        fragment.add_statement("vec3 color = baseColor;");
    }

    // Occlusion and emissive do not apply to unlit materials.
    if !is_unlit {
        if let Some(texcoord) = texcoord.filter(|_| has_value("u_occlusionTexture")) {
            fragment.add_statement(&format!(
                "color *= texture2D(u_occlusionTexture, {texcoord}).r;"
            ));
        }
        if let Some(texcoord) = texcoord.filter(|_| has_value("u_emissiveTexture")) {
            fragment.add_statement(&format!(
                "vec3 emissive = SRGBtoLINEAR3(texture2D(u_emissiveTexture, {texcoord}).rgb);"
            ));
            if has_value("u_emissiveFactor") {
                fragment.add_statement("emissive *= u_emissiveFactor;");
            }
            fragment.add_statement("color += emissive;");
        } else if has_value("u_emissiveFactor") {
            fragment.add_statement("color += u_emissiveFactor;");
        }
    }

    fragment.add_statement("color = LINEARtoSRGB(color);");
    match material.alpha_mode {
        Some(AlphaMode::Mask) => {
            fragment.add_statement("if (baseColorWithAlpha.a < u_alphaCutoff)");
            fragment.add_statement("{");
            fragment.add_statement("    discard;");
            fragment.add_statement("}");
            fragment.add_statement("gl_FragColor = vec4(color, 1.0);");
        }
        Some(AlphaMode::Blend) => {
            fragment.add_statement("gl_FragColor = vec4(color, baseColorWithAlpha.a);");
        }
        _ => {
            fragment.add_statement("gl_FragColor = vec4(color, 1.0);");
        }
    }

    // ------------------------------------------------------------------
    // Record shaders, program, technique
    // ------------------------------------------------------------------
    let vertex_shader = container.add_shader(ShaderStage::Vertex, vertex.build());
    let fragment_shader = container.add_shader(ShaderStage::Fragment, fragment.build());
    let program = container.add_program(Program {
        vertex_shader,
        fragment_shader,
    });
    container.add_technique(Technique {
        program,
        attributes,
        uniforms,
    })
}

/// Emits the lit shading path: BRDF input resolution, direct lighting, and
/// the image-based lighting approximation. Leaves `vec3 color` defined.
fn emit_lighting(
    fragment: &mut ShaderBuilder,
    use_spec_gloss: bool,
    texcoord: Option<&str>,
    has_value: &dyn Fn(&str) -> bool,
) {
    if use_spec_gloss {
        if let Some(texcoord) = texcoord.filter(|_| has_value("u_specularGlossinessTexture")) {
            fragment.add_statement(&format!(
                "vec4 specularGlossiness = SRGBtoLINEAR4(texture2D(u_specularGlossinessTexture, {texcoord}));"
            ));
            fragment.add_statement("vec3 specular = specularGlossiness.rgb;");
            fragment.add_statement("float glossiness = specularGlossiness.a;");
            if has_value("u_specularFactor") {
                fragment.add_statement("specular *= u_specularFactor;");
            }
            if has_value("u_glossinessFactor") {
                fragment.add_statement("glossiness *= u_glossinessFactor;");
            }
        } else {
            if has_value("u_specularFactor") {
                fragment
                    .add_statement("vec3 specular = clamp(u_specularFactor, vec3(0.0), vec3(1.0));");
            } else {
                fragment.add_statement("vec3 specular = vec3(1.0);");
            }
            if has_value("u_glossinessFactor") {
                fragment.add_statement("float glossiness = clamp(u_glossinessFactor, 0.0, 1.0);");
            } else {
                fragment.add_statement("float glossiness = 1.0;");
            }
        }
        if let Some(texcoord) = texcoord.filter(|_| has_value("u_diffuseTexture")) {
            fragment.add_statement(&format!(
                "vec4 diffuse = SRGBtoLINEAR4(texture2D(u_diffuseTexture, {texcoord}));"
            ));
            if has_value("u_diffuseFactor") {
                fragment.add_statement("diffuse *= u_diffuseFactor;");
            }
        } else if has_value("u_diffuseFactor") {
            fragment.add_statement("vec4 diffuse = clamp(u_diffuseFactor, vec4(0.0), vec4(1.0));");
        } else {
            fragment.add_statement("vec4 diffuse = vec4(1.0);");
        }
    } else if let Some(texcoord) = texcoord.filter(|_| has_value("u_metallicRoughnessTexture")) {
        fragment.add_statement(&format!(
            "vec3 metallicRoughness = texture2D(u_metallicRoughnessTexture, {texcoord}).rgb;"
        ));
        fragment.add_statement("float metalness = clamp(metallicRoughness.b, 0.0, 1.0);");
        fragment.add_statement("float roughness = clamp(metallicRoughness.g, 0.04, 1.0);");
        if has_value("u_metallicFactor") {
            fragment.add_statement("metalness *= u_metallicFactor;");
        }
        if has_value("u_roughnessFactor") {
            fragment.add_statement("roughness *= u_roughnessFactor;");
        }
    } else {
        if has_value("u_metallicFactor") {
            fragment.add_statement("float metalness = clamp(u_metallicFactor, 0.0, 1.0);");
        } else {
            fragment.add_statement("float metalness = 1.0;");
        }
        if has_value("u_roughnessFactor") {
            fragment.add_statement("float roughness = clamp(u_roughnessFactor, 0.04, 1.0);");
        } else {
            fragment.add_statement("float roughness = 1.0;");
        }
    }

    fragment.add_statement("vec3 v = -normalize(v_positionEC);");

    // Direct lighting: a single sun-like source with a warm tint.
    fragment.add_statement("vec3 lightColor = vec3(1.5, 1.4, 1.2);");
    fragment.add_statement("vec3 l = normalize(gaia_sunDirectionEC);");
    fragment.add_statement("vec3 h = normalize(v + l);");
    fragment.add_statement("vec3 r = normalize(gaia_inverseViewRotation * normalize(reflect(v, n)));");
    // Does the reflection vector hit the ellipsoid?
    fragment.add_statement("gaia_ellipsoid ellipsoid = gaia_getEllipsoidEC();");
    fragment.add_statement("float vertexRadius = length(v_positionWC);");
    fragment.add_statement("float horizonDotNadir = 1.0 - min(1.0, ellipsoid.radii.x / vertexRadius);");
    fragment.add_statement("float reflectionDotNadir = dot(r, normalize(v_positionWC));");
    // gaia_inertialToFixed is a rotation about Z; flipping x inverts it.
    fragment.add_statement("r.x = -r.x;");
    fragment.add_statement("r = -normalize(gaia_inertialToFixed * r);");
    fragment.add_statement("r.x = -r.x;");
    fragment.add_statement("float NdotL = clamp(dot(n, l), 0.001, 1.0);");
    fragment.add_statement("float NdotV = abs(dot(n, v)) + 0.001;");
    fragment.add_statement("float NdotH = clamp(dot(n, h), 0.0, 1.0);");
    fragment.add_statement("float LdotH = clamp(dot(l, h), 0.0, 1.0);");
    fragment.add_statement("float VdotH = clamp(dot(v, h), 0.0, 1.0);");
    fragment.add_statement("vec3 f0 = vec3(0.04);");

    // Both material models feed the same BRDF; only the input resolution
    // differs.
    if use_spec_gloss {
        fragment.add_statement("float roughness = 1.0 - glossiness;");
        fragment.add_statement(
            "vec3 diffuseColor = diffuse.rgb * (1.0 - max(max(specular.r, specular.g), specular.b));",
        );
        fragment.add_statement("vec3 specularColor = specular;");
    } else {
        fragment.add_statement("vec3 diffuseColor = baseColor * (1.0 - metalness) * (1.0 - f0);");
        fragment.add_statement("vec3 specularColor = mix(f0, baseColor, metalness);");
    }

    fragment.add_statement("float alpha = roughness * roughness;");
    fragment.add_statement(
        "float reflectance = max(max(specularColor.r, specularColor.g), specularColor.b);",
    );
    fragment.add_statement("vec3 r90 = vec3(clamp(reflectance * 25.0, 0.0, 1.0));");
    fragment.add_statement("vec3 r0 = specularColor.rgb;");

    fragment.add_statement("vec3 F = fresnelSchlick2(r0, r90, VdotH);");
    fragment.add_statement("float G = smithVisibilityGGX(alpha, NdotL, NdotV);");
    fragment.add_statement("float D = GGX(alpha, NdotH);");

    fragment.add_statement("vec3 diffuseContribution = (1.0 - F) * lambertianDiffuse(diffuseColor);");
    fragment.add_statement("vec3 specularContribution = F * G * D / (4.0 * NdotL * NdotV);");
    fragment.add_statement("vec3 color = NdotL * lightColor * (diffuseContribution + specularContribution);");

    // Image-based lighting: blend an analytic sky/ground gradient with the
    // environment cube sample and the BRDF lookup texture.
    fragment.add_statement("float inverseRoughness = 1.04 - roughness;");
    fragment.add_statement("inverseRoughness *= inverseRoughness;");
    fragment.add_statement("vec3 sceneSkyBox = textureCube(gaia_environmentMap, r).rgb * inverseRoughness;");

    fragment.add_statement("float atmosphereHeight = 0.05;");
    fragment.add_statement(
        "float blendRegionSize = 0.1 * ((1.0 - inverseRoughness) * 8.0 + 1.1 - horizonDotNadir);",
    );
    fragment.add_statement("float blendRegionOffset = roughness * -1.0;");
    fragment.add_statement(
        "float farAboveHorizon = clamp(horizonDotNadir - blendRegionSize * 0.5 + blendRegionOffset, 1.0e-10 - blendRegionSize, 0.99999);",
    );
    fragment.add_statement(
        "float aroundHorizon = clamp(horizonDotNadir + blendRegionSize * 0.5, 1.0e-10 - blendRegionSize, 0.99999);",
    );
    fragment.add_statement(
        "float farBelowHorizon = clamp(horizonDotNadir + blendRegionSize * 1.5, 1.0e-10 - blendRegionSize, 0.99999);",
    );
    fragment.add_statement(
        "float smoothstepHeight = smoothstep(0.0, atmosphereHeight, horizonDotNadir);",
    );

    fragment.add_statement(
        "vec3 belowHorizonColor = mix(vec3(0.1, 0.15, 0.25), vec3(0.4, 0.7, 0.9), smoothstepHeight);",
    );
    fragment.add_statement("vec3 nadirColor = belowHorizonColor * 0.5;");
    fragment.add_statement(
        "vec3 aboveHorizonColor = mix(vec3(0.9, 1.0, 1.2), belowHorizonColor, roughness * 0.5);",
    );
    fragment.add_statement(
        "vec3 blueSkyColor = mix(vec3(0.18, 0.26, 0.48), aboveHorizonColor, reflectionDotNadir * inverseRoughness * 0.5 + 0.75);",
    );
    fragment.add_statement("vec3 zenithColor = mix(blueSkyColor, sceneSkyBox, smoothstepHeight);");

    fragment.add_statement("vec3 blueSkyDiffuseColor = vec3(0.7, 0.85, 0.9);");
    fragment.add_statement(
        "float diffuseIrradianceFromEarth = (1.0 - horizonDotNadir) * (reflectionDotNadir * 0.25 + 0.75) * smoothstepHeight;",
    );
    fragment.add_statement(
        "float diffuseIrradianceFromSky = (1.0 - smoothstepHeight) * (1.0 - (reflectionDotNadir * 0.25 + 0.25));",
    );
    fragment.add_statement(
        "vec3 diffuseIrradiance = blueSkyDiffuseColor * clamp(diffuseIrradianceFromEarth + diffuseIrradianceFromSky, 0.0, 1.0);",
    );

    fragment.add_statement("float notDistantRough = (1.0 - horizonDotNadir * roughness * 0.8);");
    fragment.add_statement(
        "vec3 specularIrradiance = mix(zenithColor, aboveHorizonColor, smoothstep(farAboveHorizon, aroundHorizon, reflectionDotNadir) * notDistantRough);",
    );
    fragment.add_statement(
        "specularIrradiance = mix(specularIrradiance, belowHorizonColor, smoothstep(aroundHorizon, farBelowHorizon, reflectionDotNadir) * inverseRoughness);",
    );
    fragment.add_statement(
        "specularIrradiance = mix(specularIrradiance, nadirColor, smoothstep(farBelowHorizon, 1.0, reflectionDotNadir) * inverseRoughness);",
    );

    fragment.add_statement("vec2 brdfLut = texture2D(gaia_brdfLut, vec2(NdotV, 1.0 - roughness)).rg;");
    fragment.add_statement(
        "vec3 IBLColor = (diffuseIrradiance * diffuseColor) + (specularIrradiance * SRGBtoLINEAR3(specularColor * brdfLut.x + brdfLut.y));",
    );
    fragment.add_statement("color += IBLColor;");
}
