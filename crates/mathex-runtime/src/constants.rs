//! Named mathematical constants, injected into every fresh scope.

use mathex_builtins::register_constant;

register_constant!(name = "pi", value = std::f64::consts::PI);
register_constant!(name = "e", value = std::f64::consts::E);
register_constant!(name = "tau", value = std::f64::consts::TAU);
register_constant!(name = "phi", value = 1.618033988749895);
register_constant!(name = "inf", value = f64::INFINITY);
register_constant!(name = "nan", value = f64::NAN);
