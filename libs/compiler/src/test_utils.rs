//! In-memory stand-ins for solc-js releases used by engine and facade tests.

use crate::internal::module::CompilerModule;

/// Environment variable pointing at a real `soljson.js` for the opt-in end-to-end tests.
pub const SOLJSON_ENV: &str = "SOLC_BRIDGE_SOLJSON";

/// Emscripten-shaped module exposing `cwrap`, `_solidity_compile` and `_solidity_version`.
///
/// For every `contract <Name>` in a source it emits an artifact whose bytecode is derived
/// from the name. Sources containing `// warn` add a warning and sources containing
/// `syntax error` add an error diagnostic. The response also carries `calls` (compile calls
/// observed by this context), `previous` (source names of the prior call in this context),
/// `bindings` (times `cwrap` bound `solidity_compile`) and `settings` (the settings
/// object it received). It does not announce readiness; see [`SIGNAL_READY`].
const WORKING_BODY: &str = r#"
var Module = typeof Module != 'undefined' ? Module : {};
var __fakeCalls = 0;
var __fakeBindings = 0;
var __fakeLastSources = null;

function __fakeHex(text) {
  var out = '';
  for (var i = 0; i < text.length; i++) {
    var digits = text.charCodeAt(i).toString(16);
    out += (digits.length < 2 ? '0' : '') + digits;
  }
  return out;
}

function __fakeArtifact(name) {
  var body = __fakeHex(name);
  return {
    abi: [{ type: 'function', name: 'f', inputs: [], outputs: [], stateMutability: 'pure' }],
    evm: {
      bytecode: { object: '6080' + body, sourceMap: '0:1:0' },
      deployedBytecode: { object: '60' + body, sourceMap: '0:1:0' },
      methodIdentifiers: { 'f()': '26121ff0' }
    }
  };
}

Module._solidity_version = function () {
  return '0.8.29+commit.ab55807c.Emscripten.clang';
};

Module._solidity_compile = function (input) {
  __fakeCalls += 1;
  var request = JSON.parse(input);
  var names = Object.keys(request.sources);
  var response = {
    contracts: {},
    sources: {},
    calls: __fakeCalls,
    bindings: __fakeBindings,
    previous: __fakeLastSources,
    settings: request.settings
  };
  var errors = [];
  names.forEach(function (file, index) {
    var content = request.sources[file].content;
    response.sources[file] = { id: index, ast: { nodeType: 'SourceUnit', absolutePath: file } };
    if (content.indexOf('syntax error') >= 0) {
      errors.push({
        component: 'general',
        errorCode: '2314',
        formattedMessage: 'ParserError: Expected token.\n --> ' + file + '\n',
        message: 'Expected token.',
        severity: 'error',
        sourceLocation: { file: file, start: 0, end: 1 },
        type: 'ParserError'
      });
      return;
    }
    if (content.indexOf('// warn') >= 0) {
      errors.push({
        component: 'general',
        errorCode: '1878',
        formattedMessage: 'Warning: SPDX license identifier not provided.\n',
        message: 'SPDX license identifier not provided.',
        severity: 'warning',
        type: 'Warning'
      });
    }
    var pattern = /contract\s+([A-Za-z_][A-Za-z0-9_]*)/g;
    var match;
    var contracts = {};
    while ((match = pattern.exec(content)) !== null) {
      contracts[match[1]] = __fakeArtifact(match[1]);
    }
    if (Object.keys(contracts).length > 0) {
      response.contracts[file] = contracts;
    }
  });
  if (errors.length > 0) {
    response.errors = errors;
  }
  __fakeLastSources = names;
  console.log('fake compiled ' + names.length + ' sources');
  return JSON.stringify(response);
};

Module.cwrap = function (name, returnType, argTypes) {
  if (name === 'solidity_compile') {
    __fakeBindings += 1;
  }
  var target = Module['_' + name];
  return function () {
    return target.apply(null, arguments);
  };
};
"#;

/// Trailer an Emscripten runtime evaluates once it has finished initialising.
const SIGNAL_READY: &str = r#"
if (typeof Module.onRuntimeInitialized === 'function') {
  Module.onRuntimeInitialized();
}
"#;

/// Fake release whose compile entry point works as described on [`WORKING_BODY`] and
/// which announces readiness during evaluation.
pub fn working_module() -> CompilerModule {
  CompilerModule::new("fake-soljson-working", format!("{WORKING_BODY}{SIGNAL_READY}"))
    .with_version(crate::internal::solc::parse_version("0.8.29"))
}

/// Same as [`working_module`] but never calls `onRuntimeInitialized`.
pub fn silent_module() -> CompilerModule {
  CompilerModule::new("fake-soljson-silent", WORKING_BODY)
}

/// Announces readiness twice during evaluation.
pub fn double_signal_module() -> CompilerModule {
  CompilerModule::new(
    "fake-soljson-double-signal",
    format!("{WORKING_BODY}{SIGNAL_READY}{SIGNAL_READY}"),
  )
}

/// Fake release that throws while being evaluated.
pub fn throwing_module() -> CompilerModule {
  CompilerModule::new(
    "fake-soljson-throwing",
    "var Module = typeof Module != 'undefined' ? Module : {};\nthrow new Error('abort(wasm instantiation failed)');",
  )
}

/// Fake release that evaluates cleanly but never provides `cwrap`.
pub fn unbound_module() -> CompilerModule {
  CompilerModule::new(
    "fake-soljson-unbound",
    "var Module = typeof Module != 'undefined' ? Module : {};\nModule._solidity_compile = function () { return '{}'; };",
  )
}

/// Fake release whose compile entry point throws.
pub fn failing_compile_module() -> CompilerModule {
  replace_compile(
    "fake-soljson-failing",
    "function () { throw new Error('RuntimeError: unreachable'); }",
  )
}

/// Fake release whose compile entry point never returns.
pub fn looping_module() -> CompilerModule {
  replace_compile("fake-soljson-looping", "function () { for (;;) {} }")
}

/// Fake release whose compile entry point returns a number.
pub fn non_string_module() -> CompilerModule {
  replace_compile("fake-soljson-non-string", "function () { return 42; }")
}

/// Fake release whose compile entry point returns `text` verbatim.
pub fn fixed_response_module(text: &str) -> CompilerModule {
  let literal = serde_json::to_string(text).expect("encode literal");
  replace_compile(
    "fake-soljson-fixed",
    &format!("function () {{ return {literal}; }}"),
  )
}

fn replace_compile(label: &str, function: &str) -> CompilerModule {
  let code = format!("{WORKING_BODY}{SIGNAL_READY}\nModule._solidity_compile = {function};\n");
  CompilerModule::new(label, code)
}

/// Real solc-js release from [`SOLJSON_ENV`], when configured.
pub fn real_module() -> Option<CompilerModule> {
  use crate::internal::module::{FileModuleProvider, ModuleProvider};

  let path = std::env::var_os(SOLJSON_ENV)?;
  Some(
    FileModuleProvider::new(path)
      .load()
      .expect("load soljson from SOLC_BRIDGE_SOLJSON"),
  )
}
