//! Rhai driver engine
//!
//! Registers the orchestrator façade as Rhai functions. The orchestrator
//! lives behind an `Arc<Mutex<_>>` because Rhai's `sync` feature requires
//! `Send + Sync` closures; every function holds the lock for its whole call.

use crate::error::Result;
use parking_lot::Mutex;
use qcdriver_core::Error;
use qcdriver_options::OptionValue;
use qcdriver_plugin_runtime::{DynamicLoader, PluginLoader};
use qcdriver_runtime::{Orchestrator, OUTPUT_TARGET};
use rhai::{Dynamic, Engine, EvalAltResult, AST};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

type Shared<L> = Arc<Mutex<Orchestrator<L>>>;
type RhaiResult<T> = std::result::Result<T, Box<EvalAltResult>>;

/// Driver-script engine bound to one orchestrator
pub struct ScriptEngine<L: PluginLoader + 'static = DynamicLoader> {
    engine: Engine,
    orchestrator: Shared<L>,
}

impl<L: PluginLoader + 'static> fmt::Debug for ScriptEngine<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl<L: PluginLoader + 'static> ScriptEngine<L> {
    /// Create an engine driving `orchestrator`
    pub fn new(orchestrator: Orchestrator<L>) -> Self {
        let mut engine = Engine::new();

        engine.set_max_expr_depths(64, 32);
        engine.set_max_string_size(1024 * 1024);
        engine.set_max_array_size(100_000);
        engine.set_max_map_size(10_000);
        engine.on_print(|text| info!(target: OUTPUT_TARGET, "{text}"));
        engine.on_debug(|text, source, pos| {
            debug!(source = source.unwrap_or("script"), %pos, "{text}");
        });

        let orchestrator = Arc::new(Mutex::new(orchestrator));
        register_plugin_functions(&mut engine, &orchestrator);
        register_option_functions(&mut engine, &orchestrator);
        register_environment_functions(&mut engine, &orchestrator);
        register_module_functions(&mut engine, &orchestrator);

        Self {
            engine,
            orchestrator,
        }
    }

    /// Handle to the orchestrator the script drives
    pub fn orchestrator(&self) -> Shared<L> {
        Arc::clone(&self.orchestrator)
    }

    /// Compile a script without running it
    pub fn compile(&self, source: &str) -> Result<AST> {
        Ok(self.engine.compile(source)?)
    }

    /// Run a script
    pub fn run(&self, source: &str) -> Result<Dynamic> {
        let ast = self.compile(source)?;
        Ok(self.engine.eval_ast::<Dynamic>(&ast)?)
    }

    /// Run the script stored at `path`
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<Dynamic> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        debug!(script = %path.display(), "Running driver script");
        self.run(&source)
    }

    /// Close every plugin the script left loaded
    pub fn finish(&self) -> usize {
        self.orchestrator.lock().finish()
    }
}

fn rhai_error(err: Error) -> Box<EvalAltResult> {
    err.to_string().into()
}

fn register_plugin_functions<L: PluginLoader + 'static>(engine: &mut Engine, orch: &Shared<L>) {
    let o = Arc::clone(orch);
    engine.register_fn("plugin_load", move |path: &str| -> RhaiResult<i64> {
        o.lock()
            .plugin_load(path)
            .map(|status| status.code())
            .map_err(rhai_error)
    });

    let o = Arc::clone(orch);
    engine.register_fn("plugin", move |path: &str| -> RhaiResult<i64> {
        o.lock()
            .plugin(path)
            .map(|status| status.code())
            .map_err(rhai_error)
    });

    let o = Arc::clone(orch);
    engine.register_fn("plugin_close", move |path: &str| -> RhaiResult<()> {
        o.lock().plugin_close(path).map(|_| ()).map_err(rhai_error)
    });

    let o = Arc::clone(orch);
    engine.register_fn("plugin_close_all", move || {
        o.lock().plugin_close_all();
    });

    let o = Arc::clone(orch);
    engine.register_fn("plugin_status", move |path: &str| -> RhaiResult<i64> {
        o.lock()
            .plugin_status(path)
            .map(|status| status.code())
            .map_err(rhai_error)
    });
}

fn register_option_functions<L: PluginLoader + 'static>(engine: &mut Engine, orch: &Shared<L>) {
    let o = Arc::clone(orch);
    engine.register_fn("set_option", move |key: &str, value: Dynamic| -> RhaiResult<()> {
        let value = option_value(key, &value)?;
        o.lock().set_option(key, value).map_err(rhai_error)
    });

    let o = Arc::clone(orch);
    engine.register_fn(
        "set_global_option",
        move |key: &str, value: Dynamic| -> RhaiResult<()> {
            let value = option_value(key, &value)?;
            o.lock().set_global_option(key, value).map_err(rhai_error)
        },
    );

    let o = Arc::clone(orch);
    engine.register_fn("get_option", move |key: &str| -> RhaiResult<Dynamic> {
        let value = o.lock().get_option(key).map_err(rhai_error)?;
        rhai::serde::to_dynamic(&value)
    });

    let o = Arc::clone(orch);
    engine.register_fn("get_global_option", move |key: &str| -> RhaiResult<Dynamic> {
        let value = o.lock().get_global_option(key).map_err(rhai_error)?;
        rhai::serde::to_dynamic(&value)
    });

    let o = Arc::clone(orch);
    engine.register_fn("get_variable", move |key: &str| o.lock().get_variable(key));

    let o = Arc::clone(orch);
    engine.register_fn("set_variable", move |key: &str, value: f64| {
        o.lock().set_variable(key, value);
    });

    let o = Arc::clone(orch);
    engine.register_fn(
        "set_default_options_for_module",
        move |name: &str| -> RhaiResult<()> {
            o.lock()
                .set_default_options_for_module(name)
                .map_err(rhai_error)
        },
    );

    let o = Arc::clone(orch);
    engine.register_fn("print_options", move || {
        o.lock().print_options();
    });

    let o = Arc::clone(orch);
    engine.register_fn("print_global_options", move || {
        o.lock().print_global_options();
    });
}

fn register_environment_functions<L: PluginLoader + 'static>(
    engine: &mut Engine,
    orch: &Shared<L>,
) {
    let o = Arc::clone(orch);
    engine.register_fn("set_memory", move |bytes: i64| -> RhaiResult<()> {
        let bytes = u64::try_from(bytes)
            .map_err(|_| rhai_error(Error::Config(format!("invalid memory size {bytes}"))))?;
        o.lock().set_memory(bytes);
        Ok(())
    });

    let o = Arc::clone(orch);
    engine.register_fn("get_memory", move || {
        i64::try_from(o.lock().memory()).unwrap_or(i64::MAX)
    });

    let o = Arc::clone(orch);
    engine.register_fn("set_n_threads", move |n_threads: i64| -> RhaiResult<()> {
        let n_threads = usize::try_from(n_threads)
            .map_err(|_| rhai_error(Error::Config(format!("invalid thread count {n_threads}"))))?;
        o.lock().set_n_threads(n_threads);
        Ok(())
    });

    let o = Arc::clone(orch);
    engine.register_fn("get_n_threads", move || {
        i64::try_from(o.lock().n_threads()).unwrap_or(i64::MAX)
    });

    let o = Arc::clone(orch);
    engine.register_fn("print_out", move |text: &str| o.lock().print_out(text));

    let o = Arc::clone(orch);
    engine.register_fn("version", move || o.lock().version().to_string());
}

fn register_module_functions<L: PluginLoader + 'static>(engine: &mut Engine, orch: &Shared<L>) {
    let o = Arc::clone(orch);
    engine.register_fn("call_module", move |name: &str| -> RhaiResult<f64> {
        o.lock().call_module(name).map_err(rhai_error)
    });

    let names: Vec<String> = orch.lock().dispatch().names().map(str::to_string).collect();
    for name in names {
        let o = Arc::clone(orch);
        let function = name.to_lowercase();
        engine.register_fn(function, move || -> RhaiResult<f64> {
            o.lock().call_module(&name).map_err(rhai_error)
        });
    }
}

/// Convert a script value into an option value
///
/// Integers and floats inside arrays are both accepted as doubles.
fn option_value(key: &str, value: &Dynamic) -> RhaiResult<OptionValue> {
    rhai::serde::from_dynamic::<OptionValue>(value).map_err(|_| {
        rhai_error(Error::option_type(
            key,
            format!("unsupported script value of type {}", value.type_name()),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScriptError;
    use qcdriver_core::Status;
    use qcdriver_options::Data;
    use qcdriver_plugin_api::testing::MockPlugin;
    use qcdriver_plugin_api::ProcessResources;
    use qcdriver_plugin_runtime::testing::MockLoader;
    use qcdriver_runtime::{DispatchTable, FnModule};

    fn engine(loader: MockLoader) -> ScriptEngine<MockLoader> {
        let dispatch = DispatchTable::builder()
            .with_standard_modules()
            .module(
                FnModule::new("SCF", |env, _| {
                    let maxiter = env.options().get_int("MAXITER").unwrap_or(0);
                    env.set_variable("CURRENT ENERGY", -1.0 - maxiter as f64 / 1000.0);
                    Status::Success
                })
                .publishes("CURRENT ENERGY")
                .with_options(|options| options.add_int("MAXITER", 100)),
            )
            .build()
            .unwrap();
        let orchestrator = Orchestrator::builder()
            .dispatch(dispatch)
            .resources(ProcessResources::local(std::env::temp_dir(), "script-test"))
            .build_with_loader(loader);
        ScriptEngine::new(orchestrator)
    }

    #[test]
    fn test_plugin_functions() {
        let plugin = MockPlugin::new().publishing("CURRENT ENERGY", -2.5);
        let engine = engine(MockLoader::new().with_plugin("FOO", plugin.clone()));

        let result = engine
            .run(
                r#"
                let a = plugin_load("plugins/foo.so");
                let b = plugin_load("other/FOO.so");
                let s = plugin("foo.so");
                let e = get_variable("current energy");
                plugin_close("foo.so");
                plugin_close("foo.so");
                [a, b, s, plugin_status("foo.so"), e]
                "#,
            )
            .unwrap();

        let values: Vec<Dynamic> = result.into_array().unwrap();
        assert_eq!(values[0].as_int().unwrap(), 1);
        assert_eq!(values[1].as_int().unwrap(), 2);
        assert_eq!(values[2].as_int().unwrap(), 0);
        assert_eq!(values[3].as_int().unwrap(), 0);
        assert_eq!(values[4].as_float().unwrap(), -2.5);
        assert_eq!(plugin.close_call_count(), 1);
    }

    #[test]
    fn test_options_and_modules() {
        let engine = engine(MockLoader::new());
        let energy = engine
            .run(
                r#"
                set_default_options_for_module("SCF");
                set_global_option("MAXITER", 50);
                set_global_option("reference", "uhf");
                if get_global_option("REFERENCE") != "UHF" { throw "reference not set"; }
                scf()
                "#,
            )
            .unwrap();
        assert!((energy.as_float().unwrap() + 1.05).abs() < 1e-12);

        let via_module = engine.run(r#"call_module("SCF")"#).unwrap();
        assert!((via_module.as_float().unwrap() + 1.05).abs() < 1e-12);

        let status_only = engine.run("clean()").unwrap();
        assert_eq!(status_only.as_float().unwrap(), 0.0);
    }

    #[test]
    fn test_array_and_bool_options() {
        let plugin = MockPlugin::new()
            .with_option("DOCC", Data::array())
            .with_option("SCS", Data::boolean(false));
        let engine = engine(MockLoader::new().with_plugin("MP2X", plugin));

        let result = engine
            .run(
                r#"
                plugin_load("mp2x.so");
                set_option("DOCC", [3, 0.0, 1, 1]);
                set_option("SCS", "yes");
                [get_option("DOCC"), get_option("SCS")]
                "#,
            )
            .unwrap();
        let values = result.into_array().unwrap();
        let docc: Vec<f64> = values[0]
            .clone()
            .into_array()
            .unwrap()
            .into_iter()
            .map(|v| v.as_float().unwrap())
            .collect();
        assert_eq!(docc, vec![3.0, 0.0, 1.0, 1.0]);
        assert_eq!(values[1].as_int().unwrap(), 1);
    }

    #[test]
    fn test_errors_surface_as_script_errors() {
        let engine = engine(MockLoader::new());

        let err = engine.run(r#"plugin_load("missing.so")"#).unwrap_err();
        assert!(matches!(err, ScriptError::RuntimeError { .. }));

        let err = engine.run(r#"set_global_option("PRINT", "loud")"#).unwrap_err();
        assert!(err.to_string().contains("PRINT"));

        let err = engine.run(r#"call_module("NOPE")"#).unwrap_err();
        assert!(err.to_string().contains("NOPE"));

        assert!(matches!(
            engine.run("let x = ;").unwrap_err(),
            ScriptError::CompilationError { .. }
        ));
    }

    #[test]
    fn test_environment_functions() {
        let engine = engine(MockLoader::new());
        let result = engine
            .run(
                r#"
                set_memory(1000000000);
                set_n_threads(4);
                print_out("hello");
                [get_memory(), get_n_threads(), version()]
                "#,
            )
            .unwrap();
        let values = result.into_array().unwrap();
        assert_eq!(values[0].as_int().unwrap(), 1_000_000_000);
        assert_eq!(values[1].as_int().unwrap(), 4);
        assert_eq!(
            values[2].clone().into_string().unwrap(),
            qcdriver_runtime::VERSION
        );
        assert!(engine.run("set_n_threads(-1)").is_err());
    }

    #[test]
    fn test_finish_closes_plugins() {
        let plugin = MockPlugin::new();
        let engine = engine(MockLoader::new().with_plugin("FOO", plugin.clone()));
        engine.run(r#"plugin("foo.so");"#).unwrap();
        assert_eq!(engine.finish(), 1);
        assert_eq!(plugin.close_call_count(), 1);
    }

    #[test]
    fn test_run_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.rhai");
        fs::write(&path, "get_variable(\"missing\")").unwrap();

        let engine = engine(MockLoader::new());
        assert_eq!(engine.run_file(&path).unwrap().as_float().unwrap(), 0.0);
        assert!(matches!(
            engine.run_file(dir.path().join("nope.rhai")),
            Err(ScriptError::IoError { .. })
        ));
    }
}
