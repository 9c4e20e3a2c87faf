//! A GLSL declaration scanner.
//!
//! This is not a compiler. It understands exactly as much GLSL ES 1.00/3.00 as
//! reflection needs: global `attribute`/`varying`/`in`/`out`/`uniform`
//! declarations and which of them are referenced from function bodies. It also
//! rejects sources with unbalanced brackets or unterminated statements so that
//! broken shaders fail the way a driver would.

use crate::context::ShaderStage;

/// A global variable declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// GLSL type name as written (`vec3`, `sampler2D`, ...).
    pub glsl_type: String,
    pub array_len: Option<u32>,
    /// Explicit `layout(location = N)`.
    pub location: Option<u32>,
    /// Whether a function body references the name.
    pub used: bool,
}

/// Everything reflection needs to know about one compiled stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageInterface {
    /// Vertex attributes or fragment varyings.
    pub inputs: Vec<Declaration>,
    /// Vertex varyings. Fragment outputs are not tracked.
    pub outputs: Vec<Declaration>,
    pub uniforms: Vec<Declaration>,
    pub has_main: bool,
}

enum Storage {
    Input,
    Output,
    Uniform,
}

/// Scan `source` for `stage`.
///
/// Returns the stage interface, or a driver-style diagnostic log on error.
pub fn scan(stage: ShaderStage, source: &str) -> Result<StageInterface, String> {
    let source = strip_comments(source);
    check_brackets(&source)?;

    let mut interface = StageInterface::default();
    let mut bodies = String::new();
    let mut statement = String::new();
    let mut statement_line = 1;
    let mut line = 1;
    let mut depth = 0usize;

    for text_line in source.lines() {
        let trimmed = text_line.trim_start();
        if depth == 0 && trimmed.starts_with('#') {
            line += 1;
            continue;
        }
        for c in text_line.chars() {
            if depth > 0 {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        let before = bodies.trim_end();
                        if !(before.ends_with(';') || before.ends_with('{') || before.ends_with('}'))
                        {
                            return Err(syntax_error(line, "expected ';' before '}'"));
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
                bodies.push(c);
                continue;
            }
            match c {
                ';' => {
                    declare(stage, &statement, statement_line, &mut interface)?;
                    statement.clear();
                }
                '{' => {
                    let header = statement.trim();
                    if !is_block_header(header) {
                        return Err(syntax_error(statement_line, "expected ';'"));
                    }
                    if is_main(header) {
                        interface.has_main = true;
                    }
                    statement.clear();
                    bodies.push('{');
                    depth = 1;
                }
                c => {
                    if statement.trim().is_empty() && !c.is_whitespace() {
                        statement_line = line;
                    }
                    statement.push(c);
                }
            }
        }
        if depth > 0 {
            bodies.push('\n');
        } else {
            statement.push('\n');
        }
        line += 1;
    }

    if !statement.trim().is_empty() {
        return Err(syntax_error(statement_line, "unexpected end of source, expected ';'"));
    }

    for declaration in interface
        .inputs
        .iter_mut()
        .chain(interface.outputs.iter_mut())
        .chain(interface.uniforms.iter_mut())
    {
        declaration.used = references(&bodies, &declaration.name);
    }
    Ok(interface)
}

fn syntax_error(line: usize, message: &str) -> String {
    format!("ERROR: 0:{line}: {message}")
}

/// Function definitions, struct declarations and uniform blocks may open a
/// block at global scope. Uniform block members are not reflected.
fn is_block_header(header: &str) -> bool {
    let words: Vec<&str> = match header.find('(') {
        Some(paren) => header[..paren].split_whitespace().collect(),
        None => header.split_whitespace().collect(),
    };
    match words.as_slice() {
        ["struct", name] | ["uniform", name] => is_identifier(name),
        _ if header.contains('(') => {
            (2..=3).contains(&words.len())
                && words.iter().all(|word| {
                    is_identifier(word)
                        && !matches!(*word, "uniform" | "attribute" | "varying" | "in" | "out")
                })
        }
        _ => false,
    }
}

fn is_main(header: &str) -> bool {
    let mut words = header.split(|c: char| c.is_whitespace() || c == '(');
    matches!(
        (words.next(), words.next()),
        (Some("void"), Some("main"))
    )
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = ' ';
                for c in chars.by_ref() {
                    // Keep line numbers stable for diagnostics.
                    if c == '\n' {
                        out.push('\n');
                    }
                    if previous == '*' && c == '/' {
                        break;
                    }
                    previous = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

fn check_brackets(source: &str) -> Result<(), String> {
    let mut open: Vec<(char, usize)> = Vec::new();
    for (index, text_line) in source.lines().enumerate() {
        if text_line.trim_start().starts_with('#') {
            continue;
        }
        for c in text_line.chars() {
            let expected = match c {
                '{' | '(' | '[' => {
                    open.push((c, index + 1));
                    continue;
                }
                '}' => '{',
                ')' => '(',
                ']' => '[',
                _ => continue,
            };
            match open.pop() {
                Some((found, _)) if found == expected => {}
                _ => return Err(syntax_error(index + 1, &format!("unexpected '{c}'"))),
            }
        }
    }
    match open.pop() {
        Some((c, line)) => Err(syntax_error(line, &format!("unmatched '{c}'"))),
        None => Ok(()),
    }
}

/// Record a global declaration statement. Anything that is not an interface
/// declaration (precision statements, plain globals, struct tails) is ignored.
fn declare(
    stage: ShaderStage,
    statement: &str,
    line: usize,
    interface: &mut StageInterface,
) -> Result<(), String> {
    let mut rest = statement.trim();
    if rest.is_empty() {
        return Ok(());
    }

    let mut location = None;
    if let Some(after) = rest.strip_prefix("layout") {
        let after = after.trim_start();
        let Some((qualifiers, tail)) = after
            .strip_prefix('(')
            .and_then(|inner| inner.split_once(')'))
        else {
            return Err(syntax_error(line, "malformed layout qualifier"));
        };
        location = parse_layout_location(qualifiers);
        rest = tail.trim_start();
    }

    let mut words = rest.split_whitespace().peekable();
    while matches!(
        words.peek(),
        Some(&("flat" | "smooth" | "centroid" | "invariant"))
    ) {
        words.next();
    }
    let storage = match (stage, words.next()) {
        (_, Some("uniform")) => Storage::Uniform,
        (ShaderStage::Vertex, Some("attribute" | "in")) => Storage::Input,
        (ShaderStage::Vertex, Some("varying" | "out")) => Storage::Output,
        (ShaderStage::Fragment, Some("varying" | "in")) => Storage::Input,
        _ => return Ok(()),
    };
    while matches!(words.peek(), Some(&("lowp" | "mediump" | "highp"))) {
        words.next();
    }
    let Some(glsl_type) = words.next() else {
        return Err(syntax_error(line, "expected a type"));
    };
    if !is_identifier(glsl_type) {
        return Err(syntax_error(line, &format!("unexpected '{glsl_type}'")));
    }

    let declarators: String = words.collect::<Vec<_>>().join(" ");
    if declarators.is_empty() {
        return Err(syntax_error(line, "expected an identifier"));
    }
    for declarator in declarators.split(',') {
        let (name, array_len) = parse_declarator(declarator.trim())
            .ok_or_else(|| syntax_error(line, &format!("unexpected '{}'", declarator.trim())))?;
        let declaration = Declaration {
            name,
            glsl_type: glsl_type.to_string(),
            array_len,
            location,
            used: false,
        };
        match storage {
            Storage::Input => interface.inputs.push(declaration),
            Storage::Output => interface.outputs.push(declaration),
            Storage::Uniform => interface.uniforms.push(declaration),
        }
    }
    Ok(())
}

fn parse_layout_location(qualifiers: &str) -> Option<u32> {
    qualifiers.split(',').find_map(|qualifier| {
        let (key, value) = qualifier.split_once('=')?;
        (key.trim() == "location")
            .then(|| value.trim().parse().ok())
            .flatten()
    })
}

fn parse_declarator(declarator: &str) -> Option<(String, Option<u32>)> {
    let (name, array_len) = match declarator.split_once('[') {
        Some((name, rest)) => {
            let len = rest.strip_suffix(']')?.trim().parse().ok()?;
            (name.trim(), Some(len))
        }
        None => (declarator, None),
    };
    is_identifier(name).then(|| (name.to_string(), array_len))
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn references(bodies: &str, name: &str) -> bool {
    bodies
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| word == name)
}

/// GL reflection token for a GLSL type name.
///
/// Types outside the supported set still map to the token a GL driver would
/// report (`UNSIGNED_INT`, `SAMPLER_3D`, ...) so that reflection can reject them.
pub fn type_token(glsl_type: &str) -> String {
    let token = match glsl_type {
        "float" => "FLOAT",
        "vec2" => "FLOAT_VEC2",
        "vec3" => "FLOAT_VEC3",
        "vec4" => "FLOAT_VEC4",
        "int" => "INT",
        "ivec2" => "INT_VEC2",
        "ivec3" => "INT_VEC3",
        "ivec4" => "INT_VEC4",
        "bool" => "BOOL",
        "bvec2" => "BOOL_VEC2",
        "bvec3" => "BOOL_VEC3",
        "bvec4" => "BOOL_VEC4",
        "mat2" | "mat2x2" => "FLOAT_MAT2",
        "mat3" | "mat3x3" => "FLOAT_MAT3",
        "mat4" | "mat4x4" => "FLOAT_MAT4",
        "sampler2D" => "SAMPLER_2D",
        "samplerCube" => "SAMPLER_CUBE",
        "uint" => "UNSIGNED_INT",
        "uvec2" => "UNSIGNED_INT_VEC2",
        "uvec3" => "UNSIGNED_INT_VEC3",
        "uvec4" => "UNSIGNED_INT_VEC4",
        "sampler3D" => "SAMPLER_3D",
        "sampler2DShadow" => "SAMPLER_2D_SHADOW",
        "sampler2DArray" => "SAMPLER_2D_ARRAY",
        other => {
            if let Some(dims) = other.strip_prefix("mat") {
                return format!("FLOAT_MAT{dims}");
            }
            return other.to_ascii_uppercase();
        }
    };
    token.to_string()
}
