// ── Adapter implementations ──

mod device;

pub use device::DeviceStore;
