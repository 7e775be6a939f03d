use std::fmt;

use thiserror::Error;

/// Uniform types accepted in shader programs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformType {
    Float,
    Int,
    UInt,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformType {
    /// Size of the value in bytes.
    pub fn size(self) -> u64 {
        match self {
            UniformType::Float | UniformType::Int | UniformType::UInt => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec3 => 12,
            UniformType::Vec4 => 16,
            UniformType::Mat4 => 64,
        }
    }

    pub(crate) fn from_naga(inner: &naga::TypeInner) -> Option<Self> {
        use naga::{Scalar, TypeInner, VectorSize};

        match *inner {
            TypeInner::Scalar(s) if s == Scalar::F32 => Some(UniformType::Float),
            TypeInner::Scalar(s) if s == Scalar::I32 => Some(UniformType::Int),
            TypeInner::Scalar(s) if s == Scalar::U32 => Some(UniformType::UInt),
            TypeInner::Vector { size, scalar } if scalar == Scalar::F32 => Some(match size {
                VectorSize::Bi => UniformType::Vec2,
                VectorSize::Tri => UniformType::Vec3,
                VectorSize::Quad => UniformType::Vec4,
            }),
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if scalar == Scalar::F32 => Some(UniformType::Mat4),
            _ => None,
        }
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UniformType::Float => "f32",
            UniformType::Int => "i32",
            UniformType::UInt => "u32",
            UniformType::Vec2 => "vec2<f32>",
            UniformType::Vec3 => "vec3<f32>",
            UniformType::Vec4 => "vec4<f32>",
            UniformType::Mat4 => "mat4x4<f32>",
        };
        f.write_str(name)
    }
}

/// A value for a uniform slot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    UInt(u32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix.
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    /// The all-zero value of `ty`.
    pub fn zeroed(ty: UniformType) -> Self {
        match ty {
            UniformType::Float => UniformValue::Float(0.0),
            UniformType::Int => UniformValue::Int(0),
            UniformType::UInt => UniformValue::UInt(0),
            UniformType::Vec2 => UniformValue::Vec2([0.0; 2]),
            UniformType::Vec3 => UniformValue::Vec3([0.0; 3]),
            UniformType::Vec4 => UniformValue::Vec4([0.0; 4]),
            UniformType::Mat4 => UniformValue::Mat4([[0.0; 4]; 4]),
        }
    }

    pub fn ty(&self) -> UniformType {
        match self {
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::UInt(_) => UniformType::UInt,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
            UniformValue::Mat4(_) => UniformType::Mat4,
        }
    }

    /// Host-shareable byte representation, as uploaded to the uniform buffer.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::Int(v) => bytemuck::bytes_of(v),
            UniformValue::UInt(v) => bytemuck::bytes_of(v),
            UniformValue::Vec2(v) => bytemuck::bytes_of(v),
            UniformValue::Vec3(v) => bytemuck::bytes_of(v),
            UniformValue::Vec4(v) => bytemuck::bytes_of(v),
            UniformValue::Mat4(v) => bytemuck::bytes_of(v),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        UniformValue::UInt(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<[[f32; 4]; 4]> for UniformValue {
    fn from(v: [[f32; 4]; 4]) -> Self {
        UniformValue::Mat4(v)
    }
}

/// Outcome of a uniform write.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformStatus {
    /// The program declares the uniform and the value was stored.
    Set,
    /// The program does not declare the uniform; nothing changed.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UniformError {
    #[error("uniform `{name}` is declared as {expected}, got a {found} value")]
    TypeMismatch {
        name: String,
        expected: UniformType,
        found: UniformType,
    },
}

/// One named uniform of a compiled program with its current value.
#[derive(Debug, Clone)]
pub struct UniformSlot {
    name: String,
    binding: u32,
    ty: UniformType,
    value: UniformValue,
    dirty: bool,
}

impl UniformSlot {
    pub(crate) fn new(name: String, binding: u32, ty: UniformType) -> Self {
        Self {
            name,
            binding,
            ty,
            value: UniformValue::zeroed(ty),
            dirty: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binding index inside bind group 0.
    pub fn binding(&self) -> u32 {
        self.binding
    }

    pub fn ty(&self) -> UniformType {
        self.ty
    }

    pub fn value(&self) -> UniformValue {
        self.value
    }

    /// Whether the value changed since the last upload.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn set(&mut self, value: UniformValue) -> Result<(), UniformError> {
        if value.ty() != self.ty {
            return Err(UniformError::TypeMismatch {
                name: self.name.clone(),
                expected: self.ty,
                found: value.ty(),
            });
        }
        self.value = value;
        self.dirty = true;
        Ok(())
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_bytes_match_declared_size() {
        let types = [
            UniformType::Float,
            UniformType::Int,
            UniformType::UInt,
            UniformType::Vec2,
            UniformType::Vec3,
            UniformType::Vec4,
            UniformType::Mat4,
        ];
        for ty in types {
            let v = UniformValue::zeroed(ty);
            assert_eq!(v.ty(), ty);
            assert_eq!(v.as_bytes().len() as u64, ty.size(), "{ty}");
        }
    }

    #[test]
    fn vec2_bytes_are_little_endian_floats() {
        let v = UniformValue::from([800.0f32, 600.0]);
        let back: [f32; 2] = bytemuck::pod_read_unaligned(v.as_bytes());
        assert_eq!(back, [800.0, 600.0]);
    }

    #[test]
    fn slot_rejects_wrong_type_and_keeps_value() {
        let mut slot = UniformSlot::new("u_time".into(), 1, UniformType::Float);
        slot.set(UniformValue::Float(2.5)).unwrap();
        slot.mark_clean();

        let err = slot.set(UniformValue::Vec2([1.0, 2.0])).unwrap_err();
        assert_eq!(
            err,
            UniformError::TypeMismatch {
                name: "u_time".into(),
                expected: UniformType::Float,
                found: UniformType::Vec2,
            }
        );
        assert_eq!(slot.value(), UniformValue::Float(2.5));
        assert!(!slot.is_dirty());
    }

    #[test]
    fn new_slot_is_zeroed_and_clean() {
        let slot = UniformSlot::new("u_resolution".into(), 0, UniformType::Vec2);
        assert_eq!(slot.value(), UniformValue::Vec2([0.0, 0.0]));
        assert!(!slot.is_dirty());
    }
}
