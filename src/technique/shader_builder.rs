//! Structured GLSL shader assembly.
//!
//! The compiler decides *what* to emit — declarations, helper functions,
//! main-body statements — and records each into its section here. The final
//! source string is assembled once at the end, so conditional inclusion can
//! be asserted on section contents without parsing GLSL.

use std::fmt::Write;

/// Indentation applied to main-body statements.
const BODY_INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq)]
struct UniformDecl {
    name: String,
    glsl_type: &'static str,
    array_length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
struct VarDecl {
    name: String,
    glsl_type: String,
}

/// Accumulates one shader stage's declarations and statements by section.
#[derive(Debug, Clone, Default)]
pub struct ShaderBuilder {
    extensions: Vec<String>,
    uniforms: Vec<UniformDecl>,
    attributes: Vec<VarDecl>,
    varyings: Vec<VarDecl>,
    functions: Vec<String>,
    body: Vec<String>,
}

impl ShaderBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a raw `#extension` block emitted before everything else.
    pub fn add_extension(&mut self, block: &str) {
        self.extensions.push(block.trim_end().to_string());
    }

    pub fn add_uniform(&mut self, name: &str, glsl_type: &'static str, array_length: Option<usize>) {
        self.uniforms.push(UniformDecl {
            name: name.to_string(),
            glsl_type,
            array_length,
        });
    }

    pub fn add_attribute(&mut self, name: &str, glsl_type: &str) {
        self.attributes.push(VarDecl {
            name: name.to_string(),
            glsl_type: glsl_type.to_string(),
        });
    }

    pub fn add_varying(&mut self, name: &str, glsl_type: &str) {
        self.varyings.push(VarDecl {
            name: name.to_string(),
            glsl_type: glsl_type.to_string(),
        });
    }

    /// Adds a helper function definition, emitted between declarations and
    /// `main`.
    pub fn add_function(&mut self, source: &str) {
        self.functions.push(source.trim_end().to_string());
    }

    /// Adds one statement to the main body, indented.
    pub fn add_statement(&mut self, statement: &str) {
        self.body.push(format!("{BODY_INDENT}{statement}"));
    }

    /// Adds an unindented preprocessor line to the main body.
    pub fn add_directive(&mut self, directive: &str) {
        self.body.push(directive.to_string());
    }

    #[must_use]
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.iter().any(|u| u.name == name)
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    #[must_use]
    pub fn has_varying(&self, name: &str) -> bool {
        self.varyings.iter().any(|v| v.name == name)
    }

    #[must_use]
    pub fn uniform_names(&self) -> Vec<&str> {
        self.uniforms.iter().map(|u| u.name.as_str()).collect()
    }

    /// Assembles the final source: extensions, precision, uniform /
    /// attribute / varying declarations, helper functions, then `main`.
    #[must_use]
    pub fn build(&self) -> String {
        let mut source = String::new();
        for extension in &self.extensions {
            let _ = writeln!(source, "{extension}");
        }
        source.push_str("precision highp float;\n");
        for uniform in &self.uniforms {
            match uniform.array_length {
                Some(length) => {
                    let _ = writeln!(
                        source,
                        "uniform {} {}[{length}];",
                        uniform.glsl_type, uniform.name
                    );
                }
                None => {
                    let _ = writeln!(source, "uniform {} {};", uniform.glsl_type, uniform.name);
                }
            }
        }
        for attribute in &self.attributes {
            let _ = writeln!(source, "attribute {} {};", attribute.glsl_type, attribute.name);
        }
        for varying in &self.varyings {
            let _ = writeln!(source, "varying {} {};", varying.glsl_type, varying.name);
        }
        for function in &self.functions {
            let _ = writeln!(source, "{function}\n");
        }
        source.push_str("void main(void)\n{\n");
        for line in &self.body {
            let _ = writeln!(source, "{line}");
        }
        source.push_str("}\n");
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_assemble_in_order() {
        let mut builder = ShaderBuilder::new();
        builder.add_uniform("u_projectionMatrix", "mat4", None);
        builder.add_uniform("u_jointMatrix", "mat4", Some(4));
        builder.add_attribute("a_position", "vec3");
        builder.add_varying("v_normal", "vec3");
        builder.add_statement("gl_Position = vec4(a_position, 1.0);");

        let source = builder.build();
        assert!(source.starts_with("precision highp float;\n"));
        assert!(source.contains("uniform mat4 u_jointMatrix[4];"));
        let uniform_at = source.find("uniform mat4 u_projectionMatrix;").unwrap();
        let attribute_at = source.find("attribute vec3 a_position;").unwrap();
        let varying_at = source.find("varying vec3 v_normal;").unwrap();
        let main_at = source.find("void main(void)").unwrap();
        assert!(uniform_at < attribute_at);
        assert!(attribute_at < varying_at);
        assert!(varying_at < main_at);
        assert!(source.contains("    gl_Position = vec4(a_position, 1.0);\n"));
    }

    #[test]
    fn extensions_precede_precision() {
        let mut builder = ShaderBuilder::new();
        builder.add_extension(
            "#ifdef GL_OES_standard_derivatives\n#extension GL_OES_standard_derivatives : enable\n#endif",
        );
        let source = builder.build();
        assert!(source.find("#extension").unwrap() < source.find("precision").unwrap());
    }

    #[test]
    fn queries_report_declared_names() {
        let mut builder = ShaderBuilder::new();
        builder.add_uniform("u_baseColorFactor", "vec4", None);
        assert!(builder.has_uniform("u_baseColorFactor"));
        assert!(!builder.has_uniform("u_baseColorTexture"));
        assert_eq!(builder.uniform_names(), ["u_baseColorFactor"]);
    }
}
