//! GraphQL SDL rendering of a compiled schema.

use std::fmt::Write;

use super::compiled::CompiledSchema;
use super::resolver::{RootField, RootOperation};
use super::types::{FieldDefinition, TypeDefinition, TypeKind};

fn description(out: &mut String, indent: &str, text: &Option<String>) {
    if let Some(text) = text {
        let _ = writeln!(out, "{indent}\"\"\"{text}\"\"\"");
    }
}

fn args(out: &mut String, args: &[FieldDefinition]) {
    if !args.is_empty() {
        let rendered: Vec<String> = args.iter().map(|a| format!("{}: {}", a.name, a.ty)).collect();
        let _ = write!(out, "({})", rendered.join(", "));
    }
}

fn field(out: &mut String, f: &FieldDefinition) {
    description(out, "  ", &f.description);
    let _ = write!(out, "  {}", f.name);
    args(out, &f.args);
    let _ = write!(out, ": {}", f.ty);
    if let Some(reason) = &f.deprecation {
        let _ = write!(out, " @deprecated(reason: {reason:?})");
    }
    out.push('\n');
}

fn type_block(out: &mut String, t: &TypeDefinition) {
    description(out, "", &t.description);
    match t.kind {
        TypeKind::Enum => {
            let _ = writeln!(out, "enum {} {{", t.name);
            for v in &t.enum_values {
                description(out, "  ", &v.description);
                let _ = writeln!(out, "  {}", v.name);
            }
            out.push_str("}\n");
        }
        TypeKind::Union => {
            let _ = writeln!(out, "union {} = {}", t.name, t.union_members.join(" | "));
        }
        TypeKind::Object | TypeKind::Interface | TypeKind::Input => {
            let keyword = match t.kind {
                TypeKind::Interface => "interface",
                TypeKind::Input => "input",
                _ => "type",
            };
            let _ = write!(out, "{keyword} {}", t.name);
            if !t.interfaces.is_empty() {
                let _ = write!(out, " implements {}", t.interfaces.join(" & "));
            }
            out.push_str(" {\n");
            for f in &t.fields {
                field(out, f);
            }
            out.push_str("}\n");
        }
    }
}

fn root_block(out: &mut String, op: RootOperation, fields: &[RootField]) {
    let _ = writeln!(out, "type {op} {{");
    for f in fields {
        description(out, "  ", &f.description);
        let _ = write!(out, "  {}", f.name);
        args(out, &f.args);
        let _ = writeln!(out, ": {}", f.ty);
    }
    out.push_str("}\n");
}

impl CompiledSchema {
    /// Renders every type followed by the non-empty root operation types.
    pub fn to_sdl(&self) -> String {
        let mut blocks = Vec::new();
        for t in self.types() {
            let mut out = String::new();
            type_block(&mut out, t);
            blocks.push(out);
        }
        for op in [
            RootOperation::Query,
            RootOperation::Mutation,
            RootOperation::Subscription,
        ] {
            let fields = self.root_fields(op);
            if !fields.is_empty() {
                let mut out = String::new();
                root_block(&mut out, op, fields);
                blocks.push(out);
            }
        }
        blocks.join("\n")
    }
}
