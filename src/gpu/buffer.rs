//! Vertex buffers that grow to fit each frame's draw list.

use bytemuck::Pod;

/// Smallest allocation, in bytes.
const MIN_CAPACITY: u64 = 4096;

/// A `COPY_DST` buffer reallocated (doubling) when a frame outgrows it.
pub struct GrowableBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    usage: wgpu::BufferUsages,
    label: &'static str,
    len: u32,
}

impl GrowableBuffer {
    pub fn new(device: &wgpu::Device, label: &'static str, usage: wgpu::BufferUsages) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        Self {
            buffer: allocate(device, label, usage, MIN_CAPACITY),
            capacity: MIN_CAPACITY,
            usage,
            label,
            len: 0,
        }
    }

    /// Upload `data`, reallocating first if it does not fit.
    pub fn write<T: Pod>(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[T]) {
        self.len = data.len() as u32;
        if data.is_empty() {
            return;
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let needed = bytes.len() as u64;
        if needed > self.capacity {
            let capacity = needed.next_power_of_two().max(MIN_CAPACITY);
            log::debug!("{}: growing {} -> {} bytes", self.label, self.capacity, capacity);
            self.buffer.destroy();
            self.buffer = allocate(device, self.label, self.usage, capacity);
            self.capacity = capacity;
        }
        queue.write_buffer(&self.buffer, 0, bytes);
    }

    /// Elements written by the last [`GrowableBuffer::write`].
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Release GPU memory now rather than on drop.
    pub fn destroy(&mut self) {
        self.buffer.destroy();
        self.len = 0;
    }
}

fn allocate(device: &wgpu::Device, label: &'static str, usage: wgpu::BufferUsages, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    })
}
