//! Per-dialect compatibility rewrites.
//!
//! Each rewrite is a named `CompatRule` compiled once in `CompatFixer::new` and never mutated,
//! so a fixer can be shared across threads. Adding a dialect or a rule only touches the rule
//! list built here.

use std::collections::BTreeMap;

use regex::Regex;
use toyglsl_core::{ShaderAnalysis, ShaderTarget, ToyglslError, TranspilerConfig};

use crate::scan::{self, paren};
use crate::{compile, DECL_START};

/// old function name -> new function name, per target.
pub type FunctionReplacementTable = BTreeMap<ShaderTarget, BTreeMap<&'static str, &'static str>>;

pub fn default_replacement_table() -> FunctionReplacementTable {
    let mut table = FunctionReplacementTable::new();
    table.insert(
        ShaderTarget::WebGL1,
        BTreeMap::from([
            ("textureLod", "texture2DLodEXT"),
            ("textureGrad", "texture2DGradEXT"),
            ("textureProj", "texture2DProj"),
        ]),
    );
    table.insert(
        ShaderTarget::WebGL2,
        BTreeMap::from([
            ("texture2D", "texture"),
            ("textureCube", "texture"),
            ("texture2DLodEXT", "textureLod"),
        ]),
    );
    table
}

/// Rewritten text may grow to this multiple of the configured source limit.
pub const OUTPUT_GROWTH_FACTOR: usize = 4;

const ALL_TARGETS: &[ShaderTarget] = &ShaderTarget::ALL;
const WEBGL1_ONLY: &[ShaderTarget] = &[ShaderTarget::WebGL1];
const WEBGL2_ONLY: &[ShaderTarget] = &[ShaderTarget::WebGL2];
const DESKTOP330_ONLY: &[ShaderTarget] = &[ShaderTarget::Desktop330];
const DESKTOP420_ONLY: &[ShaderTarget] = &[ShaderTarget::Desktop420];

/// `radians(x)` -> `(x * pi/180)`.
pub fn inline_radians(args: &[&str]) -> Option<String> {
    match args {
        [x] => Some(format!("({} * 0.017453292519943295)", paren(x))),
        _ => None,
    }
}

/// `degrees(x)` -> `(x * 180/pi)`.
pub fn inline_degrees(args: &[&str]) -> Option<String> {
    match args {
        [x] => Some(format!("({} * 57.29577951308232)", paren(x))),
        _ => None,
    }
}

/// `mod(a, b)` -> `(a - b * floor(a / b))`, sign-correct for negative operands.
pub fn expand_mod(args: &[&str]) -> Option<String> {
    match args {
        [a, b] => {
            let (a, b) = (paren(a), paren(b));
            Some(format!("({a} - {b} * floor({a} / {b}))"))
        }
        _ => None,
    }
}

fn has_side_effects(expr: &str) -> bool {
    expr.contains("++") || expr.contains("--") || expr.contains('=')
}

/// `pow(x, 2.0)` -> `(x * x)`. Skipped when `x` would be evaluated twice with side effects.
pub fn square_pow(args: &[&str]) -> Option<String> {
    match args {
        [x, e] if matches!(*e, "2" | "2." | "2.0") && !has_side_effects(x) => {
            let x = paren(x);
            Some(format!("({x} * {x})"))
        }
        _ => None,
    }
}

#[derive(Debug)]
enum Rewrite {
    /// Literal function renames from the replacement table.
    Table(Vec<(Regex, String)>),
    /// Call rewrite over parsed arguments.
    Call {
        pattern: Regex,
        rewrite: fn(&[&str]) -> Option<String>,
    },
    /// Plain regex substitution.
    Substitute {
        pattern: Regex,
        replacement: &'static str,
    },
    /// Split `float a = 1., b;` into one statement per declarator.
    SplitDeclarations(Regex),
}

/// A named rewrite restricted to a set of targets.
#[derive(Debug)]
pub struct CompatRule {
    pub name: &'static str,
    targets: &'static [ShaderTarget],
    rewrite: Rewrite,
}

impl CompatRule {
    fn call(
        name: &'static str,
        targets: &'static [ShaderTarget],
        function: &str,
        rewrite: fn(&[&str]) -> Option<String>,
    ) -> Result<Self, ToyglslError> {
        let pattern = compile(name, &format!(r"\b{}\s*\(", regex::escape(function)))?;
        Ok(Self {
            name,
            targets,
            rewrite: Rewrite::Call { pattern, rewrite },
        })
    }

    pub fn applies_to(&self, target: ShaderTarget) -> bool {
        self.targets.contains(&target)
    }

    /// Apply the rule. Call rewrites fail once their output passes `max_len` bytes.
    pub fn apply(&self, code: &str, max_len: usize) -> Result<String, ToyglslError> {
        match &self.rewrite {
            Rewrite::Table(renames) => {
                let mut out = code.to_string();
                for (pattern, to) in renames {
                    out = pattern.replace_all(&out, to.as_str()).into_owned();
                }
                Ok(out)
            }
            Rewrite::Call { pattern, rewrite } => {
                scan::rewrite_calls(self.name, code, pattern, rewrite, max_len)
            }
            Rewrite::Substitute {
                pattern,
                replacement,
            } => Ok(pattern.replace_all(code, *replacement).into_owned()),
            Rewrite::SplitDeclarations(start) => Ok(scan::split_multi_declarations(code, start)),
        }
    }
}

#[derive(Debug)]
pub struct CompatFixer {
    table: FunctionReplacementTable,
    rules: Vec<CompatRule>,
    pow_square: CompatRule,
    split_declarations: CompatRule,
    output_limit: usize,
    complex_mat2: Regex,
    log_call: Regex,
}

impl CompatFixer {
    pub fn new() -> Result<Self, ToyglslError> {
        Self::with_table(default_replacement_table())
    }

    pub fn with_table(table: FunctionReplacementTable) -> Result<Self, ToyglslError> {
        let mut rules = Vec::new();

        for (target, renames) in &table {
            let compiled = renames
                .iter()
                .map(|(from, to)| {
                    let pattern =
                        compile("function_table", &format!(r"\b{}\s*\(", regex::escape(from)))?;
                    Ok((pattern, format!("{to}(")))
                })
                .collect::<Result<Vec<_>, ToyglslError>>()?;
            let targets: &'static [ShaderTarget] = match target {
                ShaderTarget::WebGL1 => WEBGL1_ONLY,
                ShaderTarget::WebGL2 => WEBGL2_ONLY,
                ShaderTarget::Desktop330 => DESKTOP330_ONLY,
                ShaderTarget::Desktop420 => DESKTOP420_ONLY,
            };
            rules.push(CompatRule {
                name: "function_table",
                targets,
                rewrite: Rewrite::Table(compiled),
            });
        }

        rules.push(CompatRule::call(
            "radians_inline",
            WEBGL1_ONLY,
            "radians",
            inline_radians,
        )?);
        rules.push(CompatRule::call(
            "degrees_inline",
            WEBGL1_ONLY,
            "degrees",
            inline_degrees,
        )?);
        rules.push(CompatRule::call(
            "mod_expansion",
            WEBGL1_ONLY,
            "mod",
            expand_mod,
        )?);
        rules.push(CompatRule {
            name: "empty_for_init",
            targets: ALL_TARGETS,
            rewrite: Rewrite::Substitute {
                pattern: compile("empty_for_init", r"\bfor\s*\(\s*;")?,
                replacement: "for (int _loop = 0;",
            },
        });

        Ok(Self {
            table,
            rules,
            pow_square: CompatRule::call("pow_square", WEBGL1_ONLY, "pow", square_pow)?,
            split_declarations: CompatRule {
                name: "split_multi_declarations",
                targets: WEBGL1_ONLY,
                rewrite: Rewrite::SplitDeclarations(compile(
                    "split_multi_declarations",
                    DECL_START,
                )?),
            },
            output_limit: TranspilerConfig::default()
                .max_source_bytes
                .saturating_mul(OUTPUT_GROWTH_FACTOR),
            complex_mat2: compile(
                "annotate",
                r"mat2\s*\(\s*cos\s*\([^)]+\)\s*\+\s*vec4\s*\([^)]+\)\s*\)",
            )?,
            log_call: compile("annotate", r"\blog\(")?,
        })
    }

    /// Cap on the size of any rewritten text, see [`OUTPUT_GROWTH_FACTOR`].
    pub fn with_output_limit(mut self, max_len: usize) -> Self {
        self.output_limit = max_len;
        self
    }

    pub fn output_limit(&self) -> usize {
        self.output_limit
    }

    pub fn replacement_table(&self) -> &FunctionReplacementTable {
        &self.table
    }

    /// Names of the rules `fix` applies for `target`, in application order.
    pub fn rule_names(&self, target: ShaderTarget) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|r| r.applies_to(target))
            .map(|r| r.name)
            .collect()
    }

    fn run(&self, rule: &CompatRule, code: String) -> Result<String, ToyglslError> {
        let out = rule.apply(&code, self.output_limit)?;
        if out.len() > self.output_limit {
            return Err(ToyglslError::rule(
                rule.name,
                format!("rewritten text exceeds {} bytes", self.output_limit),
            ));
        }
        if out != code {
            tracing::trace!(rule = rule.name, "rewrite applied");
        }
        Ok(out)
    }

    /// Table renames, then the target's rule set, then global fixes.
    pub fn fix(&self, code: &str, target: ShaderTarget) -> Result<String, ToyglslError> {
        let mut out = code.to_string();
        for rule in self.rules.iter().filter(|r| r.applies_to(target)) {
            out = self.run(rule, out)?;
        }
        Ok(out)
    }

    /// Rewrites that are only worth running when the analysis saw the construct.
    pub fn apply_analysis_fixes(
        &self,
        code: &str,
        target: ShaderTarget,
        analysis: &ShaderAnalysis,
    ) -> Result<String, ToyglslError> {
        let mut out = code.to_string();
        if analysis.used_functions.contains("pow") && self.pow_square.applies_to(target) {
            out = self.run(&self.pow_square, out)?;
        }
        if analysis.has_multi_declarations && self.split_declarations.applies_to(target) {
            out = self.run(&self.split_declarations, out)?;
        }
        Ok(out)
    }

    /// Advisory comments prepended to WebGL1 bodies.
    pub fn annotate(&self, code: &str, target: ShaderTarget, config: &TranspilerConfig) -> String {
        if target != ShaderTarget::WebGL1 || !config.annotate {
            return code.to_string();
        }
        let mut notes = String::new();
        if code.len() > config.complexity_warning_bytes {
            notes.push_str(
                "// WARNING: This shader is very complex for WebGL1 - performance issues expected\n",
            );
        }
        if self.complex_mat2.is_match(code) {
            notes.push_str(
                "// Warning: Complex mat2 constructor may need manual adjustment for WebGL1\n",
            );
        }
        if self.log_call.is_match(code) {
            notes.push_str("// Note: log() function used - ensure proper precision on mobile\n");
        }
        notes.push_str(code);
        notes
    }
}
