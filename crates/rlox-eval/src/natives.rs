//! Host functions bound in every interpreter's globals.

use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::environment::Environment;
use crate::value::{NativeFunction, Value};

const NATIVES: &[NativeFunction] = &[NativeFunction {
    name: "clock",
    arity: 0,
    func: clock,
}];

/// Seconds since the Unix epoch.
fn clock(_args: &[Value]) -> Value {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    Value::Number(secs)
}

pub(crate) fn define_natives(globals: &mut Environment) {
    for native in NATIVES {
        let value = Value::Native(Rc::new(NativeFunction {
            name: native.name,
            arity: native.arity,
            func: native.func,
        }));
        globals.define(native.name, value);
    }
}
