//! Rhai script engine for code cells.
//!
//! Every run gets a freshly built [`Engine`] and an empty [`Scope`], so no
//! variables, functions or state survive from one run to the next and
//! nothing from the host is visible beyond the output functions below.
//!
//! ## Output
//!
//! - `console.log(a, b, ...)` / `console.error(a, b, ...)`: up to eight
//!   arguments joined by single spaces, then a newline. Maps and arrays are
//!   printed as indented JSON, everything else as its plain string form.
//! - `print(x)` / `debug(x)`: Rhai built-ins, one line each.
//!
//! Everything lands in the same sink, in call order.
//!
//! ## Limits
//!
//! Operation count, call depth, expression depth and container sizes come
//! from [`ScriptLimits`]. Modules are disabled.
//!
//! # Example
//!
//! ```ignore
//! let engine = RhaiEngine::new();
//! let sink = Arc::new(CaptureBuffer::new());
//! engine.run(r#"console.log("sum", 40 + 2);"#, sink.clone())?;
//! assert_eq!(sink.contents(), "sum 42\n");
//! ```

use std::sync::Arc;

use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Dynamic, Engine, EvalAltResult, Scope};
use tracing::debug;

use crate::config::ScriptLimits;
use crate::executor::{OutputSink, ScriptEngine};

/// Methods exposed on the `console` object.
const CONSOLE_METHODS: [&str; 2] = ["log", "error"];

/// The `console` value scripts print through.
#[derive(Clone)]
struct Console {
    sink: Arc<dyn OutputSink>,
}

impl Console {
    fn emit(&self, args: &[Dynamic]) {
        let mut line = args.iter().map(format_value).collect::<Vec<_>>().join(" ");
        line.push('\n');
        self.sink.write(&line);
    }
}

/// String form of a script value as it appears in output.
fn format_value(value: &Dynamic) -> String {
    if value.is_map() || value.is_array() {
        match rhai::serde::from_dynamic::<serde_json::Value>(value) {
            Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| value.to_string()),
            Err(_) => value.to_string(),
        }
    } else {
        value.to_string()
    }
}

/// User-facing message for a failed run.
///
/// A thrown value becomes its own string form, however deeply nested the
/// script function that threw it. Anything else keeps Rhai's message and position.
fn error_message(err: &EvalAltResult) -> String {
    let mut innermost = err;
    while let EvalAltResult::ErrorInFunctionCall(_, _, inner, _) = innermost {
        innermost = inner.as_ref();
    }
    match innermost {
        EvalAltResult::ErrorRuntime(value, _) => {
            let message = value.to_string();
            if message.is_empty() { err.to_string() } else { message }
        }
        _ => err.to_string(),
    }
}

// register_fn needs a closure per arity
macro_rules! register_console_method {
    ($engine:ident, $name:expr $(, $arg:ident)*) => {
        $engine.register_fn($name, |console: &mut Console $(, $arg: Dynamic)*| {
            console.emit(&[$($arg),*]);
        });
    };
}

/// Rhai execution engine.
#[derive(Debug, Clone, Default)]
pub struct RhaiEngine {
    limits: ScriptLimits,
}

impl RhaiEngine {
    /// Engine with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ScriptLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ScriptLimits {
        &self.limits
    }

    /// Create a configured Rhai engine wired to `sink`.
    fn create_engine(&self, sink: Arc<dyn OutputSink>) -> Engine {
        let mut engine = Engine::new();

        // Configure safety limits
        let limits = &self.limits;
        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);

        // No imports
        engine.set_max_modules(0);
        engine.set_module_resolver(DummyModuleResolver::new());

        Self::register_output(&mut engine, sink);
        engine
    }

    /// Route `print`, `debug` and the `console` methods into `sink`.
    fn register_output(engine: &mut Engine, sink: Arc<dyn OutputSink>) {
        let print_sink = sink.clone();
        engine.on_print(move |text| {
            print_sink.write(&format!("{}\n", text));
        });

        let debug_sink = sink;
        engine.on_debug(move |text, _source, _pos| {
            debug_sink.write(&format!("{}\n", text));
        });

        engine.register_type_with_name::<Console>("Console");
        for name in CONSOLE_METHODS {
            register_console_method!(engine, name);
            register_console_method!(engine, name, a);
            register_console_method!(engine, name, a, b);
            register_console_method!(engine, name, a, b, c);
            register_console_method!(engine, name, a, b, c, d);
            register_console_method!(engine, name, a, b, c, d, e);
            register_console_method!(engine, name, a, b, c, d, e, f);
            register_console_method!(engine, name, a, b, c, d, e, f, g);
            register_console_method!(engine, name, a, b, c, d, e, f, g, h);
        }
    }
}

impl ScriptEngine for RhaiEngine {
    fn name(&self) -> &str {
        "rhai"
    }

    fn description(&self) -> &str {
        "Rhai scripting engine with console output capture"
    }

    #[tracing::instrument(skip(self, source, sink), name = "engine.rhai")]
    fn run(&self, source: &str, sink: Arc<dyn OutputSink>) -> Result<(), String> {
        let engine = self.create_engine(sink.clone());
        let mut scope = Scope::new();
        scope.push("console", Console { sink });

        match engine.run_with_scope(&mut scope, source) {
            Ok(()) => {
                debug!("Rhai execution success");
                Ok(())
            }
            Err(e) => {
                let message = error_message(&e);
                debug!("Rhai execution error: {}", e);
                Err(message)
            }
        }
    }
}
