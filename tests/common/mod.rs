//! Shared mock host, backend, and evaluator for the integration suite.

// Not every test binary exercises every fixture.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use modweave::{
    CompilerBackend, EmitOutput, Evaluator, ExportsHandle, FetchedModule, Loader, MediaType,
    ModuleDefinition, ModuleFactory, ModuleHost, ServiceHost,
};

pub const BAR_SOURCE: &str = "import * as std from \"std\";\nconsole.log(std);\nexport const foo = \"bar\";\n";
pub const BAZ_SOURCE: &str = "import { foo } from \"./bar.ts\";\nconsole.log(foo);\n";

pub const BAR_OUTPUT: &str = "define([\"require\", \"exports\", \"std\"], function (require, exports, std) {\n    exports.foo = \"bar\";\n});\n//# sourceURL=/root/project/foo/bar.ts";
pub const BAZ_OUTPUT: &str = "define([\"require\", \"exports\", \"./bar.ts\"], function (require, exports, bar) {\n    console.log(bar.foo);\n});\n//# sourceURL=/root/project/foo/baz.ts";

pub const MOD_A_SOURCE: &str = "import { B } from \"./modB.ts\";\n\nexport class A {\n  b = new B();\n};\n";
pub const MOD_B_SOURCE: &str = "import { A } from \"./modA.ts\";\n\nexport class B {\n  a = new A();\n};\n";

pub const MOD_A_OUTPUT: &str = "define([\"require\", \"exports\", \"./modB.ts\"], function (require, exports, modB) {\n    exports.A = \"A\";\n});";
pub const MOD_B_OUTPUT: &str = "define([\"require\", \"exports\", \"./modA.ts\"], function (require, exports, modA) {\n    exports.B = \"B\";\n});";

pub type FetchLog = Arc<Mutex<Vec<(String, String)>>>;
pub type CacheLog = Arc<Mutex<Vec<(String, String, String)>>>;
pub type EmitLog = Arc<Mutex<Vec<String>>>;
pub type DefinitionStack = Arc<Mutex<Vec<ModuleDefinition>>>;

fn module_info(
    module_name: &str,
    file_name: &str,
    media_type: MediaType,
    source_code: &str,
    output_code: Option<&str>,
) -> FetchedModule {
    FetchedModule {
        module_name: module_name.to_string(),
        file_name: file_name.to_string(),
        media_type,
        source_code: source_code.to_string(),
        output_code: output_code.map(String::from),
    }
}

/// In-memory module host: a fixed `(containing file, specifier)` map plus
/// call logs for fetches and cache writes.
pub struct MockHost {
    modules: HashMap<(String, String), FetchedModule>,
    pub fetches: FetchLog,
    pub cache_writes: CacheLog,
}

impl MockHost {
    fn project() -> Self {
        let mut modules = HashMap::new();
        let mut add = |containing: &str, specifier: &str, info: FetchedModule| {
            modules.insert((containing.to_string(), specifier.to_string()), info);
        };

        add(
            "/root/project",
            "foo/bar.ts",
            module_info(
                "/root/project/foo/bar.ts",
                "/root/project/foo/bar.ts",
                MediaType::TypedScript,
                BAR_SOURCE,
                None,
            ),
        );
        add(
            "/root/project",
            "foo/baz.ts",
            module_info(
                "/root/project/foo/baz.ts",
                "/root/project/foo/baz.ts",
                MediaType::TypedScript,
                BAZ_SOURCE,
                Some(BAZ_OUTPUT),
            ),
        );
        add(
            "/root/project/foo/baz.ts",
            "./bar.ts",
            module_info(
                "/root/project/foo/bar.ts",
                "/root/project/foo/bar.ts",
                MediaType::TypedScript,
                BAR_SOURCE,
                Some(BAR_OUTPUT),
            ),
        );
        add(
            "/root/project",
            "some.txt",
            module_info(
                "/root/project/some.txt",
                "/root/project/some.txt",
                MediaType::Unknown,
                "console.log();",
                None,
            ),
        );
        add(
            "/root/project",
            "modA.ts",
            module_info(
                "modA",
                "/root/project/modA.ts",
                MediaType::TypedScript,
                MOD_A_SOURCE,
                None,
            ),
        );
        add(
            "/root/project/modA.ts",
            "./modB.ts",
            module_info(
                "modB",
                "/root/project/modB.ts",
                MediaType::TypedScript,
                MOD_B_SOURCE,
                None,
            ),
        );
        add(
            "/root/project/modB.ts",
            "./modA.ts",
            module_info(
                "modA",
                "/root/project/modA.ts",
                MediaType::TypedScript,
                MOD_A_SOURCE,
                None,
            ),
        );

        for (specifier, media_type) in [
            ("foo.ts", MediaType::TypedScript),
            ("foo.d.ts", MediaType::TypedScript),
            ("foo.js", MediaType::Script),
            ("foo.json", MediaType::Json),
            ("foo.txt", MediaType::Script),
        ] {
            add(
                "/moduleKinds",
                specifier,
                module_info(
                    "foo",
                    &format!("/moduleKinds/{specifier}"),
                    media_type,
                    "console.log('foo');",
                    None,
                ),
            );
        }

        Self {
            modules,
            fetches: Arc::new(Mutex::new(Vec::new())),
            cache_writes: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ModuleHost for MockHost {
    fn fetch(&self, specifier: &str, containing_file: &str) -> Option<FetchedModule> {
        self.fetches
            .lock()
            .push((specifier.to_string(), containing_file.to_string()));
        self.modules
            .get(&(containing_file.to_string(), specifier.to_string()))
            .cloned()
    }

    fn write_cache(&self, file_name: &str, source_code: &str, output_code: &str) {
        self.cache_writes.lock().push((
            file_name.to_string(),
            source_code.to_string(),
            output_code.to_string(),
        ));
    }
}

/// Backend that emits a fixed text per file name and logs every emit call.
pub struct MockBackend {
    outputs: HashMap<String, String>,
    pub emits: EmitLog,
}

impl MockBackend {
    fn project() -> Self {
        let mut outputs = HashMap::new();
        outputs.insert("/root/project/foo/bar.ts".to_string(), BAR_OUTPUT.to_string());
        outputs.insert("/root/project/foo/baz.ts".to_string(), BAZ_OUTPUT.to_string());
        outputs.insert("/root/project/modA.ts".to_string(), MOD_A_OUTPUT.to_string());
        outputs.insert("/root/project/modB.ts".to_string(), MOD_B_OUTPUT.to_string());
        Self {
            outputs,
            emits: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl CompilerBackend for MockBackend {
    fn emit(&mut self, file_name: &str, _host: &dyn ServiceHost) -> EmitOutput {
        self.emits.lock().push(file_name.to_string());
        match self.outputs.get(file_name) {
            Some(text) => EmitOutput {
                output_files: vec![text.clone()],
                emit_skipped: false,
                diagnostics: Vec::new(),
            },
            None => EmitOutput {
                output_files: Vec::new(),
                emit_skipped: true,
                diagnostics: Vec::new(),
            },
        }
    }
}

/// Evaluator fed from a stack of prepared module definitions, mirroring
/// an execution environment where evaluated output calls `define`.
pub struct MockEvaluator {
    pub definitions: DefinitionStack,
}

impl Evaluator for MockEvaluator {
    fn evaluate(&mut self, output_code: &str) -> Result<ModuleDefinition, String> {
        self.definitions
            .lock()
            .pop()
            .ok_or_else(|| format!("unexpected evaluation of: {output_code}"))
    }
}

/// One test's loader plus handles into every mock's state.
pub struct TestContext {
    pub loader: Loader,
    pub fetches: FetchLog,
    pub cache_writes: CacheLog,
    pub emits: EmitLog,
    pub definitions: DefinitionStack,
    pub std_exports: ExportsHandle,
}

impl TestContext {
    /// Push a prepared definition; the next evaluation pops it.
    pub fn push_definition(&self, deps: &[&str], factory: ModuleFactory) {
        self.definitions.lock().push(ModuleDefinition {
            deps: deps.iter().map(|d| d.to_string()).collect(),
            factory,
        });
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().len()
    }

    pub fn cache_write_count(&self) -> usize {
        self.cache_writes.lock().len()
    }

    pub fn emit_count(&self) -> usize {
        self.emits.lock().len()
    }
}

/// Build a loader over the fixture project with the `std` builtin
/// registered.
pub fn setup() -> TestContext {
    let _ = env_logger::builder().is_test(true).try_init();

    let host = MockHost::project();
    let fetches = host.fetches.clone();
    let cache_writes = host.cache_writes.clone();

    let backend = MockBackend::project();
    let emits = backend.emits.clone();

    let definitions: DefinitionStack = Arc::new(Mutex::new(Vec::new()));
    let evaluator = MockEvaluator {
        definitions: definitions.clone(),
    };

    let loader = Loader::new(Box::new(host), Box::new(backend), Box::new(evaluator));
    let std_exports = ExportsHandle::new();
    loader.register_builtin("std", std_exports.clone());

    TestContext {
        loader,
        fetches,
        cache_writes,
        emits,
        definitions,
        std_exports,
    }
}
