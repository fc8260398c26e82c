//! One-shot V8 execution context that hosts a solc-js module.
//!
//! solc-js announces readiness through `Module.onRuntimeInitialized`, a callback an
//! event loop would normally schedule. An isolate has no event loop, so the bridge
//! evaluates the module and then fires the binding hook itself, synchronously and
//! exactly once, before looking up the compile entry point.

use std::sync::Once;

use crate::compiler::lifecycle::{EnginePhase, EngineState, Lifecycle};
use crate::internal::errors::{Error, Result};
use crate::internal::module::CompilerModule;
use crate::internal::solc;

const BOOTSTRAP: &str = include_str!("bootstrap.js");
const FIRE_READY: &str = "__solcBridge.bind();";
const BRIDGE_GLOBAL: &str = "__solcBridge";
const ENTRY_POINT: &str = "compile";
const READ_SIGNALLED: &str = "String(__solcBridge.signalled)";
const READ_VERSION: &str =
  "typeof __solcBridge.version === 'function' ? String(__solcBridge.version()) : null";
const READ_OUTPUT: &str = "__solcBridge.output.length ? __solcBridge.output.join('\\n') : null";

fn init_platform() {
  static INIT: Once = Once::new();
  INIT.call_once(|| {
    let platform = v8::new_default_platform(0, false).make_shared();
    v8::V8::initialize_platform(platform);
    v8::V8::initialize();
  });
}

/// Thread-safe handle that forcibly stops JavaScript running in one execution
/// context. Terminating a context that already finished is a no-op.
#[derive(Clone)]
pub struct TerminationHandle {
  handle: v8::IsolateHandle,
}

impl TerminationHandle {
  /// Request termination. Returns `false` when the context has already been disposed.
  pub fn terminate(&self) -> bool {
    self.handle.terminate_execution()
  }
}

/// Owns exactly one isolated execution context for exactly one compilation.
///
/// [`EngineBridge::invoke`] consumes the bridge, so a context can never be reused;
/// the isolate and everything the module installed in its globals is dropped when
/// the call returns. Bridges are not `Send`: create one on the thread that uses it.
pub struct EngineBridge {
  isolate: v8::OwnedIsolate,
}

impl EngineBridge {
  pub fn new() -> Self {
    init_platform();
    Self {
      isolate: v8::Isolate::new(v8::CreateParams::default()),
    }
  }

  /// Handle a host can use from another thread to impose a deadline.
  pub fn termination_handle(&self) -> TerminationHandle {
    TerminationHandle {
      handle: self.isolate.thread_safe_handle(),
    }
  }

  /// Load `module`, fire its ready hook, and call the bound compile entry point
  /// with `request`. Returns the raw response string without parsing it.
  pub fn invoke(self, module: &CompilerModule, request: &str) -> Result<String> {
    let mut isolate = self.isolate;
    let mut lifecycle = Lifecycle::new();
    let result = drive(&mut isolate, &mut lifecycle, module, request);
    if result.is_err() {
      lifecycle.fail();
    }
    log::debug!(
      "execution context for {} finished in state {:?}",
      module.label(),
      lifecycle.state()
    );
    result
  }
}

impl Default for EngineBridge {
  fn default() -> Self {
    Self::new()
  }
}

enum ScriptFailure {
  Terminated,
  Threw(String),
}

impl ScriptFailure {
  fn into_error(self, phase: EnginePhase) -> Error {
    match self {
      ScriptFailure::Terminated => Error::EngineTerminated { phase },
      ScriptFailure::Threw(message) => match phase {
        EnginePhase::Evaluating => Error::EngineEval { message },
        EnginePhase::Initializing => Error::EngineInit { message },
        EnginePhase::Invoking => Error::EngineInvoke { message },
      },
    }
  }
}

fn drive(
  isolate: &mut v8::OwnedIsolate,
  lifecycle: &mut Lifecycle,
  module: &CompilerModule,
  request: &str,
) -> Result<String> {
  let scope = &mut v8::HandleScope::new(isolate);
  let context = v8::Context::new(scope, Default::default());
  let scope = &mut v8::ContextScope::new(scope, context);
  let scope = &mut v8::TryCatch::new(scope);

  // Phase 1: load.
  step(lifecycle, EngineState::Evaluating)?;
  evaluate(scope, BOOTSTRAP).map_err(|failure| failure.into_error(EnginePhase::Evaluating))?;
  let loaded = evaluate(scope, module.code());
  if loaded.is_ok() {
    scope.perform_microtask_checkpoint();
  }
  flush_output(scope, module);
  loaded.map_err(|failure| failure.into_error(EnginePhase::Evaluating))?;

  let signalled = evaluate_to_string(scope, READ_SIGNALLED)
    .ok()
    .flatten()
    .map(|value| value == "true")
    .unwrap_or(false);
  log::trace!(
    "{} evaluated; runtime signalled readiness during evaluation: {signalled}",
    module.label()
  );
  evaluate(scope, FIRE_READY).map_err(|failure| failure.into_error(EnginePhase::Initializing))?;

  // Phase 2: bind.
  let Some(entry_point) = bound_entry_point(scope) else {
    return Err(Error::EngineInit {
      message: format!(
        "{} does not expose solidity_compile after initialization",
        module.label()
      ),
    });
  };
  step(lifecycle, EngineState::Ready)?;
  log_reported_version(scope, module);

  // Phase 3: invoke.
  step(lifecycle, EngineState::Invoking)?;
  let argument = v8::String::new(scope, request).ok_or_else(|| Error::EngineInvoke {
    message: format!(
      "request of {} bytes exceeds the engine string limit",
      request.len()
    ),
  })?;
  let receiver: v8::Local<v8::Value> = v8::undefined(scope).into();
  let returned = entry_point.call(scope, receiver, &[argument.into()]);
  let Some(value) = returned else {
    let failure = caught(scope);
    flush_output(scope, module);
    return Err(failure.into_error(EnginePhase::Invoking));
  };
  if !value.is_string() {
    return Err(Error::EngineInvoke {
      message: "compile entry point returned a non-string value".into(),
    });
  }
  let response = value.to_rust_string_lossy(scope);
  flush_output(scope, module);

  step(lifecycle, EngineState::Completed)?;
  Ok(response)
}

/// Advance the lifecycle or fail the invocation when the transition is refused.
fn step(lifecycle: &mut Lifecycle, next: EngineState) -> Result<()> {
  if lifecycle.advance(next) {
    return Ok(());
  }
  let message = format!(
    "illegal engine transition {:?} -> {next:?}",
    lifecycle.state()
  );
  Err(match next {
    EngineState::Invoking | EngineState::Completed => Error::EngineInvoke { message },
    _ => Error::EngineInit { message },
  })
}

fn caught(scope: &mut v8::TryCatch<v8::HandleScope>) -> ScriptFailure {
  if scope.has_terminated() {
    return ScriptFailure::Terminated;
  }
  let message = scope
    .exception()
    .map(|exception| exception.to_rust_string_lossy(scope))
    .filter(|message| !message.is_empty())
    .unwrap_or_else(|| "unknown exception".to_string());
  ScriptFailure::Threw(message)
}

fn run_script<'s, 'p>(
  scope: &mut v8::TryCatch<'s, v8::HandleScope<'p>>,
  code: &str,
) -> std::result::Result<v8::Local<'p, v8::Value>, ScriptFailure> {
  let Some(source) = v8::String::new(scope, code) else {
    return Err(ScriptFailure::Threw(format!(
      "script of {} bytes exceeds the engine string limit",
      code.len()
    )));
  };
  let Some(script) = v8::Script::compile(scope, source, None) else {
    return Err(caught(scope));
  };
  match script.run(scope) {
    Some(value) => Ok(value),
    None => Err(caught(scope)),
  }
}

fn evaluate(
  scope: &mut v8::TryCatch<v8::HandleScope>,
  code: &str,
) -> std::result::Result<(), ScriptFailure> {
  run_script(scope, code).map(|_| ())
}

fn evaluate_to_string(
  scope: &mut v8::TryCatch<v8::HandleScope>,
  code: &str,
) -> std::result::Result<Option<String>, ScriptFailure> {
  let value = run_script(scope, code)?;
  if value.is_null_or_undefined() {
    return Ok(None);
  }
  Ok(Some(value.to_rust_string_lossy(scope)))
}

fn bound_entry_point<'s>(scope: &mut v8::HandleScope<'s>) -> Option<v8::Local<'s, v8::Function>> {
  let context = scope.get_current_context();
  let global = context.global(scope);
  let bridge_key = v8::String::new(scope, BRIDGE_GLOBAL)?;
  let bridge = global.get(scope, bridge_key.into())?;
  let bridge = v8::Local::<v8::Object>::try_from(bridge).ok()?;
  let entry_key = v8::String::new(scope, ENTRY_POINT)?;
  let entry_point = bridge.get(scope, entry_key.into())?;
  v8::Local::<v8::Function>::try_from(entry_point).ok()
}

fn log_reported_version(scope: &mut v8::TryCatch<v8::HandleScope>, module: &CompilerModule) {
  let Ok(Some(banner)) = evaluate_to_string(scope, READ_VERSION) else {
    return;
  };
  log::debug!("{} reports compiler version {banner}", module.label());
  if let (Some(expected), Some(reported)) = (module.version(), solc::version_from_banner(&banner)) {
    if *expected != reported {
      log::warn!(
        "{} was labelled {expected} but reports {reported}",
        module.label()
      );
    }
  }
}

/// Forward anything the module printed to the log and clear the buffer.
fn flush_output(scope: &mut v8::TryCatch<v8::HandleScope>, module: &CompilerModule) {
  if scope.has_terminated() {
    return;
  }
  if let Ok(Some(output)) = evaluate_to_string(scope, READ_OUTPUT) {
    for line in output.lines() {
      log::debug!("[{}] {line}", module.label());
    }
    let _ = evaluate(scope, "__solcBridge.output.length = 0;");
  }
}
