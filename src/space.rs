use crate::config::SpaceLimits;
use crate::{vector::Vector, Result, VectoError};
use ndarray::Array1;
use rand::Rng;
use tracing::debug;

/// Read-only view of the current vector set and optional probe.
///
/// The core only ever reads through this trait; callers hand over a
/// snapshot and may not mutate it while a computation borrows it.
pub trait VectorSource {
    fn vectors(&self) -> &[Vector];
    fn input_vector(&self) -> Option<&Vector>;

    fn get(&self, id: u64) -> Option<&Vector> {
        self.vectors().iter().find(|v| v.id == id)
    }

    fn count(&self) -> usize {
        self.vectors().len()
    }
}

/// Owned vector set with a fixed dimensionality.
///
/// Vectors keep insertion order, which is the order force edges and
/// analysis assignments refer to.
pub struct VectorSpace {
    dimensions: usize,
    vectors: Vec<Vector>,
    input: Option<Vector>,
    limits: SpaceLimits,
    next_id: u64,
}

impl VectorSpace {
    pub fn new(dimensions: usize) -> Result<Self> {
        Self::with_limits(dimensions, SpaceLimits::default())
    }

    pub fn with_limits(dimensions: usize, limits: SpaceLimits) -> Result<Self> {
        if dimensions > limits.max_dimensions {
            return Err(VectoError::InvalidConfig(format!(
                "{} dimensions exceeds the limit of {}",
                dimensions, limits.max_dimensions
            )));
        }
        Ok(Self {
            dimensions,
            vectors: Vec::new(),
            input: None,
            limits,
            next_id: 0,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn limits(&self) -> &SpaceLimits {
        &self.limits
    }

    fn check_shape(&self, vector: &Vector) -> Result<()> {
        if vector.dimension() != self.dimensions {
            return Err(VectoError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.dimension(),
            });
        }
        Ok(())
    }

    /// Next unused id, for callers that build vectors themselves.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Adds a vector under its own id. `u64::MAX` is reserved so the id
    /// counter can never wrap.
    pub fn insert(&mut self, vector: Vector) -> Result<()> {
        self.check_shape(&vector)?;
        let following = vector.id.checked_add(1).ok_or_else(|| {
            VectoError::InvalidConfig(format!("vector id {} is reserved", vector.id))
        })?;
        if self.vectors.iter().any(|v| v.id == vector.id) {
            return Err(VectoError::DuplicateId(vector.id));
        }
        if self.vectors.len() >= self.limits.max_vectors {
            return Err(VectoError::InvalidConfig(format!(
                "vector limit of {} reached",
                self.limits.max_vectors
            )));
        }
        self.next_id = self.next_id.max(following);
        self.vectors.push(vector);
        Ok(())
    }

    /// Inserts `components` under a freshly allocated id and returns it.
    pub fn push(&mut self, components: Array1<f64>) -> Result<u64> {
        let id = self.next_id;
        self.insert(Vector::new(id, components))?;
        Ok(id)
    }

    /// Replaces the components of an existing vector, keeping its id and layout.
    pub fn update(&mut self, id: u64, components: Array1<f64>) -> Result<()> {
        if components.len() != self.dimensions {
            return Err(VectoError::DimensionMismatch {
                expected: self.dimensions,
                actual: components.len(),
            });
        }
        let vector = self
            .vectors
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(VectoError::MissingId(id))?;
        vector.components = components;
        Ok(())
    }

    pub fn remove(&mut self, id: u64) -> Result<Vector> {
        let position = self
            .vectors
            .iter()
            .position(|v| v.id == id)
            .ok_or(VectoError::MissingId(id))?;
        Ok(self.vectors.remove(position))
    }

    pub fn clear(&mut self) {
        self.vectors.clear();
    }

    pub fn set_input_vector(&mut self, vector: Vector) -> Result<()> {
        self.check_shape(&vector)?;
        self.input = Some(vector);
        Ok(())
    }

    pub fn clear_input_vector(&mut self) -> Option<Vector> {
        self.input.take()
    }

    /// Drops every vector and fills the space with `count` fresh ones,
    /// each component uniform in [-1, 1).
    pub fn regenerate<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> Result<()> {
        if count > self.limits.max_vectors {
            return Err(VectoError::InvalidConfig(format!(
                "{} vectors exceeds the limit of {}",
                count, self.limits.max_vectors
            )));
        }
        self.vectors.clear();
        for data in generate_random_vectors(self.dimensions, count, rng) {
            self.push(data)?;
        }
        debug!(count, dimensions = self.dimensions, "Regenerated vector space");
        Ok(())
    }

    /// Changes the active dimensionality, truncating or zero-padding every
    /// vector (and the probe) so the shared-length invariant keeps holding.
    pub fn coerce_dimensions(&mut self, dimensions: usize) -> Result<()> {
        if dimensions > self.limits.max_dimensions {
            return Err(VectoError::InvalidConfig(format!(
                "{} dimensions exceeds the limit of {}",
                dimensions, self.limits.max_dimensions
            )));
        }
        for vector in self.vectors.iter_mut().chain(self.input.iter_mut()) {
            vector.components = resize_components(&vector.components, dimensions);
        }
        debug!(from = self.dimensions, to = dimensions, "Coerced dimensionality");
        self.dimensions = dimensions;
        Ok(())
    }
}

impl VectorSource for VectorSpace {
    fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    fn input_vector(&self) -> Option<&Vector> {
        self.input.as_ref()
    }
}

fn resize_components(components: &Array1<f64>, dimensions: usize) -> Array1<f64> {
    Array1::from_shape_fn(dimensions, |i| components.get(i).copied().unwrap_or(0.0))
}

pub fn generate_random_vectors<R: Rng + ?Sized>(
    dim: usize,
    num: usize,
    rng: &mut R,
) -> Vec<Array1<f64>> {
    (0..num)
        .map(|_| Array1::from_shape_fn(dim, |_| rng.gen_range(-1.0..1.0)))
        .collect()
}
