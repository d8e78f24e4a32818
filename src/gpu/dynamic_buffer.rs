//! Growable typed GPU buffer.
//!
//! Grows by doubling when a write exceeds capacity. GPU buffers cannot be
//! resized in place, so growth means a new buffer and the caller must
//! rebuild any bind group that referenced the old one.

use std::marker::PhantomData;

/// Smallest allocation, in bytes. Keeps storage bindings non-empty.
const MIN_CAPACITY_BYTES: u64 = 64;

/// A GPU buffer of `T` items that can grow.
pub struct DynamicBuffer<T> {
    buffer: wgpu::Buffer,
    /// Capacity in bytes.
    capacity: u64,
    /// Items currently written.
    count: usize,
    usage: wgpu::BufferUsages,
    label: String,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> DynamicBuffer<T> {
    /// Buffer with room for `capacity` items.
    pub fn with_capacity(
        device: &wgpu::Device,
        label: &str,
        capacity: usize,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let capacity = (item_size::<T>() * capacity as u64).max(MIN_CAPACITY_BYTES);
        Self {
            buffer: create(device, label, capacity, usage),
            capacity,
            count: 0,
            usage,
            label: label.to_owned(),
            _marker: PhantomData,
        }
    }

    /// Replace the whole contents, growing if necessary.
    ///
    /// Returns `true` if the buffer was reallocated (bind groups need
    /// recreation).
    pub fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[T],
    ) -> bool {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let needed = bytes.len() as u64;

        let reallocated = needed > self.capacity;
        if reallocated {
            self.capacity = grown_capacity(self.capacity, needed);
            self.buffer =
                create(device, &self.label, self.capacity, self.usage);
        }

        if needed > 0 {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.count = data.len();
        reallocated
    }

    /// Replace the contents without reallocating.
    ///
    /// Returns `false` (and writes nothing) if `data` does not fit the
    /// current allocation.
    pub fn write_in_place(&mut self, queue: &wgpu::Queue, data: &[T]) -> bool {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if bytes.len() as u64 > self.capacity {
            return false;
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.count = data.len();
        true
    }

    /// Overwrite the single item at `index` without touching the rest.
    ///
    /// Returns `false` if `index` is past the written range.
    pub fn write_at(&self, queue: &wgpu::Queue, index: usize, item: &T) -> bool {
        if index >= self.count {
            return false;
        }
        let offset = item_size::<T>() * index as u64;
        queue.write_buffer(&self.buffer, offset, bytemuck::bytes_of(item));
        true
    }

    /// The underlying buffer.
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Number of items written.
    pub fn count(&self) -> usize {
        self.count
    }

    /// `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

fn item_size<T>() -> u64 {
    size_of::<T>() as u64
}

fn create(
    device: &wgpu::Device,
    label: &str,
    size: u64,
    usage: wgpu::BufferUsages,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// 2x growth, at least 1 KiB more than before.
fn grown_capacity(current: u64, needed: u64) -> u64 {
    (needed * 2).max(current + 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_doubles_large_requests() {
        assert_eq!(grown_capacity(64, 4096), 8192);
    }

    #[test]
    fn growth_adds_at_least_one_kib() {
        assert_eq!(grown_capacity(4096, 4100), 8200);
        assert_eq!(grown_capacity(64, 72), 1088);
    }
}
