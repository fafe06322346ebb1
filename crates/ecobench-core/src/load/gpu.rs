//! GPU busy loop: random tensors, elementwise multiply, sum.
//!
//! Each iteration uploads two fresh `f32` tensors, runs a WGSL compute pass
//! that multiplies them elementwise and reduces every workgroup to one
//! partial sum, then reads the partials back and finishes the sum on the
//! host. The device lives in a [`GpuContext`] and is released when the
//! context is dropped.

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;

use rand::Rng;
use serde::Serialize;
use wgpu::util::DeviceExt;

use super::{LoadKind, LoadReport, drive};
use crate::error::GpuError;

/// Default outer iteration count.
pub const DEFAULT_ITERATIONS: u64 = 1_000;
/// Default tensor length (1024 × 1024).
pub const DEFAULT_ELEMENTS: usize = 1 << 20;

/// Threads per workgroup. Must match `@workgroup_size` in [`SHADER`].
pub const WORKGROUP_SIZE: u32 = 256;
/// Per-dimension dispatch limit guaranteed by every wgpu backend.
pub const MAX_WORKGROUPS: u32 = 65_535;

const SHADER: &str = r#"
struct Params {
    len: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}

@group(0) @binding(0) var<storage, read> lhs: array<f32>;
@group(0) @binding(1) var<storage, read> rhs: array<f32>;
@group(0) @binding(2) var<storage, read_write> partials: array<f32>;
@group(0) @binding(3) var<uniform> params: Params;

var<workgroup> scratch: array<f32, 256>;

@compute @workgroup_size(256)
fn main(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(local_invocation_id) lid: vec3<u32>,
    @builtin(workgroup_id) wid: vec3<u32>,
) {
    var value = 0.0;
    if (gid.x < params.len) {
        value = lhs[gid.x] * rhs[gid.x];
    }
    scratch[lid.x] = value;
    workgroupBarrier();

    for (var stride = 128u; stride > 0u; stride = stride / 2u) {
        if (lid.x < stride) {
            scratch[lid.x] = scratch[lid.x] + scratch[lid.x + stride];
        }
        workgroupBarrier();
    }

    if (lid.x == 0u) {
        partials[wid.x] = scratch[0];
    }
}
"#;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
    len: u32,
    _pad: [u32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuLoadConfig {
    pub iterations: u64,
    pub elements: usize,
}

impl Default for GpuLoadConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            elements: DEFAULT_ELEMENTS,
        }
    }
}

impl GpuLoadConfig {
    pub fn validate(&self) -> Result<(), GpuError> {
        workgroup_count(self.elements).map(|_| ())
    }
}

/// Workgroups needed to cover `elements`, or an error if the tensor is
/// empty or too large for a one-dimensional dispatch.
pub fn workgroup_count(elements: usize) -> Result<u32, GpuError> {
    if elements == 0 {
        return Err(GpuError::InvalidConfig("tensor length must be positive".into()));
    }
    let groups = elements.div_ceil(WORKGROUP_SIZE as usize);
    match u32::try_from(groups) {
        Ok(g) if g <= MAX_WORKGROUPS => Ok(g),
        _ => Err(GpuError::InvalidConfig(format!(
            "tensor length {elements} exceeds the maximum of {}",
            MAX_WORKGROUPS as usize * WORKGROUP_SIZE as usize
        ))),
    }
}

/// Host reference for the shader: `Σ lhs[i]·rhs[i]`, accumulated in `f64`.
pub fn cpu_multiply_sum(lhs: &[f32], rhs: &[f32]) -> f64 {
    lhs.iter()
        .zip(rhs)
        .map(|(&a, &b)| f64::from(a * b))
        .sum()
}

/// A tensor of `len` uniform random values in `[0, 1)`.
pub fn random_tensor(rng: &mut impl Rng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.random::<f32>()).collect()
}

/// One adapter as reported by wgpu.
#[derive(Debug, Clone, Serialize)]
pub struct AdapterSummary {
    /// Position in [`enumerate_adapters`], when known.
    pub index: Option<usize>,
    pub name: String,
    pub backend: String,
    pub device_type: String,
    pub driver: String,
}

impl AdapterSummary {
    fn from_info(index: Option<usize>, info: &wgpu::AdapterInfo) -> Self {
        let driver = match (info.driver.is_empty(), info.driver_info.is_empty()) {
            (true, _) => String::new(),
            (false, true) => info.driver.clone(),
            (false, false) => format!("{} {}", info.driver, info.driver_info),
        };
        Self {
            index,
            name: info.name.clone(),
            backend: format!("{:?}", info.backend),
            device_type: format!("{:?}", info.device_type),
            driver,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}

impl fmt::Display for AdapterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(i) = self.index {
            write!(f, "[{i}] ")?;
        }
        write!(f, "{} ({}, {})", self.name, self.backend, self.device_type)?;
        if !self.driver.is_empty() {
            write!(f, " driver {}", self.driver)?;
        }
        Ok(())
    }
}

fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// Every adapter visible to wgpu, in enumeration order.
pub fn enumerate_adapters() -> Vec<AdapterSummary> {
    create_instance()
        .enumerate_adapters(wgpu::Backends::all())
        .into_iter()
        .enumerate()
        .map(|(i, adapter)| AdapterSummary::from_info(Some(i), &adapter.get_info()))
        .collect()
}

/// An acquired device plus the multiply-sum pipeline.
pub struct GpuContext {
    adapter: AdapterSummary,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
}

impl GpuContext {
    /// Acquire an adapter and device.
    ///
    /// `selector` is an adapter index from [`enumerate_adapters`] or a
    /// case-insensitive substring of the adapter name. `None`, an empty
    /// string or `"auto"` picks the high-performance adapter.
    pub fn new(selector: Option<&str>) -> Result<Self, GpuError> {
        pollster::block_on(Self::new_async(selector))
    }

    async fn new_async(selector: Option<&str>) -> Result<Self, GpuError> {
        let instance = create_instance();
        let (adapter, summary) = select_adapter(&instance, selector).await?;
        log::info!("using GPU adapter {summary}");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("ecobench"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                },
                None,
            )
            .await
            .map_err(|e| GpuError::DeviceCreation(e.to_string()))?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("multiply_sum"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("multiply_sum"),
            layout: None,
            module: &module,
            entry_point: "main",
        });

        Ok(Self {
            adapter: summary,
            device,
            queue,
            pipeline,
        })
    }

    pub fn adapter(&self) -> &AdapterSummary {
        &self.adapter
    }

    /// `Σ lhs[i]·rhs[i]` computed on the device.
    pub fn multiply_sum(&self, lhs: &[f32], rhs: &[f32]) -> Result<f64, GpuError> {
        if lhs.len() != rhs.len() {
            return Err(GpuError::InvalidConfig(format!(
                "tensor lengths differ: {} vs {}",
                lhs.len(),
                rhs.len()
            )));
        }
        let len = lhs.len();
        let groups = workgroup_count(len)?;
        let len_u32 = u32::try_from(len)
            .map_err(|_| GpuError::InvalidConfig(format!("tensor length {len} too large")))?;

        let lhs_buf = self.upload("lhs", lhs);
        let rhs_buf = self.upload("rhs", rhs);

        let partial_bytes = u64::from(groups) * std::mem::size_of::<f32>() as u64;
        let partials = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("partials"),
            size: partial_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("partials_readback"),
            size: partial_bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let params = Params {
            len: len_u32,
            _pad: [0; 3],
        };
        let params_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("params"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let layout = self.pipeline.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("multiply_sum"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: lhs_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: rhs_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: partials.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params_buf.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("multiply_sum"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("multiply_sum"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&partials, 0, &staging, 0, partial_bytes);
        self.queue.submit(std::iter::once(encoder.finish()));

        self.read_partials(&staging)
    }

    fn upload(&self, label: &str, data: &[f32]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE,
            })
    }

    fn read_partials(&self, staging: &wgpu::Buffer) -> Result<f64, GpuError> {
        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| GpuError::Readback("map callback never ran".into()))?
            .map_err(|e| GpuError::Readback(e.to_string()))?;

        let total = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, f32>(&data)
                .iter()
                .map(|&p| f64::from(p))
                .sum()
        };
        staging.unmap();
        Ok(total)
    }
}

/// Run the GPU loop until done or `stop` is raised.
///
/// Tensors are regenerated every iteration so each pass includes the
/// allocation and upload, not only the kernel.
pub fn run_gpu_load(
    ctx: &GpuContext,
    config: &GpuLoadConfig,
    stop: &AtomicBool,
) -> Result<LoadReport, GpuError> {
    config.validate()?;
    let mut rng = rand::rng();
    drive(LoadKind::Gpu, config.iterations, stop, |_| {
        let lhs = random_tensor(&mut rng, config.elements);
        let rhs = random_tensor(&mut rng, config.elements);
        ctx.multiply_sum(&lhs, &rhs)
    })
}

async fn select_adapter(
    instance: &wgpu::Instance,
    selector: Option<&str>,
) -> Result<(wgpu::Adapter, AdapterSummary), GpuError> {
    let selector = selector.map(str::trim).filter(|s| !s.is_empty() && *s != "auto");

    let Some(selector) = selector else {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        let summary = AdapterSummary::from_info(None, &adapter.get_info());
        return Ok((adapter, summary));
    };

    let adapters = instance.enumerate_adapters(wgpu::Backends::all());
    if adapters.is_empty() {
        return Err(GpuError::NoAdapter);
    }
    let by_index = selector.parse::<usize>().ok();
    adapters
        .into_iter()
        .enumerate()
        .map(|(i, adapter)| {
            let summary = AdapterSummary::from_info(Some(i), &adapter.get_info());
            (adapter, summary)
        })
        .find(|(_, summary)| match by_index {
            Some(i) => summary.index == Some(i),
            None => summary.matches(selector),
        })
        .ok_or_else(|| GpuError::NoMatchingAdapter(selector.to_string()))
}
