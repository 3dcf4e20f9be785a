//! Interpreter that converts an L-System symbol sequence into a [`Skeleton`].
//!
//! The entry point is [`SkeletonInterpreter`]. Configure it with an
//! [`InterpreterConfig`], register symbol-to-operation mappings via
//! [`SkeletonInterpreter::set_op`] or
//! [`SkeletonInterpreter::populate_standard_symbols`], then call
//! [`SkeletonInterpreter::interpret`] with a plain symbol string.
//!
//! Parametric derivations from [`symbios`] go through
//! [`SkeletonInterpreter::populate_interned_symbols`] and
//! [`SkeletonInterpreter::interpret_state`] instead.

use crate::skeleton::{Branch, Skeleton};
use crate::turtle::{STANDARD_SYMBOLS, TurtleOp, TurtleState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use symbios::{SymbiosState, SymbolTable};
use tracing::{debug, trace};

/// Configuration for skeleton interpretation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Turn angle in degrees for Yaw/Pitch/Roll when no parameter is given.
    pub angle_degrees: f32,
    /// Branch length for `F` when no parameter is given.
    pub segment_length: f32,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            angle_degrees: 25.0,
            segment_length: 0.2,
        }
    }
}

/// Walks a symbol sequence with a turtle and records every drawn segment.
#[derive(Clone, Debug)]
pub struct SkeletonInterpreter {
    char_ops: HashMap<char, TurtleOp>,
    id_ops: Vec<TurtleOp>,
    config: InterpreterConfig,
}

impl SkeletonInterpreter {
    /// Creates an interpreter with the given configuration and an empty symbol map.
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            char_ops: HashMap::new(),
            id_ops: Vec::new(),
            config,
        }
    }

    /// Creates an interpreter that understands the standard alphabet
    /// `F + - & ^ \ / [ ]`.
    pub fn standard(config: InterpreterConfig) -> Self {
        let mut interpreter = Self::new(config);
        interpreter.populate_standard_symbols();
        interpreter
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Assigns a [`TurtleOp`] to a character symbol.
    pub fn set_op(&mut self, symbol: char, op: TurtleOp) {
        self.char_ops.insert(symbol, op);
    }

    /// Assigns a [`TurtleOp`] to an interned symbol ID.
    ///
    /// The map is grown automatically when `sym_id` exceeds its current length;
    /// gaps are filled with [`TurtleOp::Ignore`].
    pub fn set_id_op(&mut self, sym_id: u16, op: TurtleOp) {
        let idx = sym_id as usize;
        if idx >= self.id_ops.len() {
            self.id_ops.resize(idx + 1, TurtleOp::Ignore);
        }
        self.id_ops[idx] = op;
    }

    /// Registers the standard alphabet for character input.
    pub fn populate_standard_symbols(&mut self) {
        for (symbol, op) in STANDARD_SYMBOLS {
            self.set_op(symbol, op);
        }
    }

    /// Registers the standard alphabet for symbols found in `interner`.
    ///
    /// Symbols that are not present in the interner are silently skipped.
    pub fn populate_interned_symbols(&mut self, interner: &SymbolTable) {
        for (symbol, op) in STANDARD_SYMBOLS {
            let mut buf = [0u8; 4];
            if let Some(id) = interner.resolve_id(symbol.encode_utf8(&mut buf)) {
                self.set_id_op(id, op);
            }
        }
    }

    /// Interprets a plain symbol string.
    ///
    /// The turtle starts at the origin heading `+Y`. Unmapped characters are
    /// ignored and `]` on an empty stack does nothing, so any input yields a
    /// (possibly empty) skeleton.
    pub fn interpret(&self, symbols: &str) -> Skeleton {
        let mut walk = Walk::default();
        for c in symbols.chars() {
            let op = self.char_ops.get(&c).copied().unwrap_or(TurtleOp::Ignore);
            walk.apply(op, self.config.segment_length, self.config.angle_degrees);
        }
        walk.finish()
    }

    /// Interprets a parametric [`SymbiosState`].
    ///
    /// The first module parameter overrides the branch length for
    /// [`TurtleOp::Forward`]/[`TurtleOp::Move`] and the angle in degrees for
    /// rotations; without parameters the config defaults are used.
    pub fn interpret_state(&self, state: &SymbiosState) -> Skeleton {
        let mut walk = Walk::default();
        for i in 0..state.len() {
            let view = match state.get_view(i) {
                Some(v) => v,
                None => break,
            };

            let op = self
                .id_ops
                .get(view.sym as usize)
                .copied()
                .unwrap_or(TurtleOp::Ignore);
            let first = view.params.first().map(|&x| x as f32);

            walk.apply(
                op,
                first.unwrap_or(self.config.segment_length),
                first.unwrap_or(self.config.angle_degrees),
            );
        }
        walk.finish()
    }
}

/// The mutable part of one interpretation run.
#[derive(Default)]
struct Walk {
    turtle: TurtleState,
    stack: Vec<TurtleState>,
    skeleton: Skeleton,
}

impl Walk {
    fn apply(&mut self, op: TurtleOp, length: f32, angle_degrees: f32) {
        let angle = angle_degrees.to_radians();
        match op {
            TurtleOp::Forward => {
                let start = self.turtle.advance(length);
                self.skeleton.push(Branch {
                    start,
                    end: self.turtle.position,
                    orientation: self.turtle.rotation,
                });
            }
            TurtleOp::Move => {
                self.turtle.advance(length);
            }
            TurtleOp::Yaw(s) => self.turtle.yaw(angle * s),
            TurtleOp::Pitch(s) => self.turtle.pitch(angle * s),
            TurtleOp::Roll(s) => self.turtle.roll(angle * s),
            TurtleOp::Push => self.stack.push(self.turtle),
            TurtleOp::Pop => match self.stack.pop() {
                Some(saved) => self.turtle = saved,
                None => trace!("pop on empty turtle stack ignored"),
            },
            TurtleOp::Ignore => {}
        }
    }

    fn finish(self) -> Skeleton {
        debug!(
            branches = self.skeleton.len(),
            unclosed_pushes = self.stack.len(),
            "interpreted skeleton"
        );
        self.skeleton
    }
}

/// Interprets `symbols` with the standard alphabet.
///
/// Emits one [`Branch`] per `F`, in order.
pub fn interpret(symbols: &str, angle_degrees: f32, segment_length: f32) -> Vec<Branch> {
    SkeletonInterpreter::standard(InterpreterConfig {
        angle_degrees,
        segment_length,
    })
    .interpret(symbols)
    .branches
}
