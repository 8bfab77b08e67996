//! Math utilities and types
//!
//! Provides the math aliases used by the renderer and the transform stack
//! that every draw path pushes onto and pops from.

use std::ops::{Deref, DerefMut};

pub use nalgebra::{Matrix4, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Stack of model transforms
///
/// Always holds at least one entry (the root). Push duplicates the top,
/// pop discards it; mutating operations apply to the top entry only.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformStack {
    entries: Vec<Mat4>,
}

impl TransformStack {
    /// Create a stack holding only the identity transform
    pub fn new() -> Self {
        Self::from_root(Mat4::identity())
    }

    /// Create a stack with a custom root transform
    pub fn from_root(root: Mat4) -> Self {
        Self { entries: vec![root] }
    }

    /// Duplicate the top entry
    pub fn push(&mut self) {
        let top = *self.top();
        self.entries.push(top);
    }

    /// Discard the top entry
    ///
    /// The root entry is never removed; popping it returns `None`.
    pub fn pop(&mut self) -> Option<Mat4> {
        if self.entries.len() > 1 {
            self.entries.pop()
        } else {
            None
        }
    }

    /// Current transform
    pub fn top(&self) -> &Mat4 {
        // `entries` is never empty, see `pop` and `restore`
        &self.entries[self.entries.len() - 1]
    }

    /// Number of entries, including the root
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Post-multiply the top entry by a non-uniform scale
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.multiply(&Mat4::new_nonuniform_scaling(&Vec3::new(x, y, z)));
    }

    /// Post-multiply the top entry by a translation
    pub fn translate(&mut self, offset: Vec3) {
        self.multiply(&Mat4::new_translation(&offset));
    }

    /// Post-multiply the top entry by an arbitrary matrix
    pub fn multiply(&mut self, matrix: &Mat4) {
        let last = self.entries.len() - 1;
        self.entries[last] = self.entries[last] * matrix;
    }

    /// Transform a point by the current top entry
    pub fn transform_point(&self, point: &Point3) -> Point3 {
        self.top().transform_point(point)
    }

    /// Push an entry and return a guard that restores the current depth on drop
    ///
    /// The guard also discards anything a callee pushed without popping, and
    /// runs during unwinding, so a failing draw cannot leak transforms. A
    /// callee that pops past the scope gets the caller's top re-pushed until
    /// the depth matches again; entries it popped below that are not recovered.
    pub fn scoped(&mut self) -> TransformScope<'_> {
        let restore_depth = self.depth();
        let restore_top = *self.top();
        self.push();
        TransformScope {
            stack: self,
            restore_depth,
            restore_top,
        }
    }

    fn restore(&mut self, depth: usize, top: Mat4) {
        if self.entries.len() < depth {
            log::warn!(
                "Transform stack popped below its scope (depth {} of {depth}), restoring caller transform",
                self.entries.len()
            );
            self.entries.resize(depth, top);
        } else {
            self.entries.truncate(depth.max(1));
        }
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped push on a [`TransformStack`]
///
/// Dereferences to the stack so callers can keep transforming and pass it on.
#[derive(Debug)]
pub struct TransformScope<'a> {
    stack: &'a mut TransformStack,
    restore_depth: usize,
    restore_top: Mat4,
}

impl Deref for TransformScope<'_> {
    type Target = TransformStack;

    fn deref(&self) -> &Self::Target {
        self.stack
    }
}

impl DerefMut for TransformScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stack
    }
}

impl Drop for TransformScope<'_> {
    fn drop(&mut self) {
        self.stack.restore(self.restore_depth, self.restore_top);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_push_pop_balances() {
        let mut stack = TransformStack::new();
        assert_eq!(stack.depth(), 1);

        stack.push();
        stack.scale(0.5, 0.5, 0.5);
        assert_eq!(stack.depth(), 2);

        let popped = stack.pop().unwrap();
        assert_relative_eq!(popped[(0, 0)], 0.5);
        assert_eq!(stack.depth(), 1);
        assert_eq!(*stack.top(), Mat4::identity());
    }

    #[test]
    fn test_root_cannot_be_popped() {
        let mut stack = TransformStack::new();
        assert!(stack.pop().is_none());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_scale_then_translate_composes() {
        let mut stack = TransformStack::new();
        stack.scale(0.5, 0.5, 0.5);
        stack.translate(Vec3::new(2.0, 0.0, 0.0));

        let p = stack.transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p.x, 1.5);
        assert_relative_eq!(p.y, 0.5);
        assert_relative_eq!(p.z, 0.5);
    }

    #[test]
    fn test_scope_restores_depth() {
        let mut stack = TransformStack::new();
        {
            let mut scope = stack.scoped();
            scope.scale(0.5, 0.5, 0.5);
            // A callee that forgets to pop
            scope.push();
            scope.push();
            assert_eq!(scope.depth(), 4);
        }
        assert_eq!(stack.depth(), 1);
        assert_eq!(*stack.top(), Mat4::identity());
    }

    #[test]
    fn test_scope_recovers_from_over_pop() {
        let mut stack = TransformStack::new();
        stack.push();
        stack.scale(0.5, 0.5, 0.5);
        let caller_top = *stack.top();
        {
            let mut scope = stack.scoped();
            scope.pop();
            scope.pop();
            scope.pop();
            assert_eq!(scope.depth(), 1);
        }
        assert_eq!(stack.depth(), 2);
        assert_eq!(*stack.top(), caller_top);

        stack.pop();
        assert_eq!(*stack.top(), Mat4::identity());
    }

    #[test]
    fn test_scope_restores_on_unwind() {
        let mut stack = TransformStack::new();
        stack.push();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut scope = stack.scoped();
            scope.scale(2.0, 2.0, 2.0);
            panic!("draw delegate failed");
        }));

        assert!(result.is_err());
        assert_eq!(stack.depth(), 2);
        assert_eq!(*stack.top(), Mat4::identity());
    }
}
