use sysinfo::System;

pub struct SystemDiagnostics;

impl SystemDiagnostics {
    pub fn log_startup_info() {
        let mut sys = System::new_all();
        sys.refresh_all();

        // OS
        let os_name = System::name().unwrap_or_else(|| "Unknown".to_string());
        let os_ver = System::os_version().unwrap_or_default();
        log::info!("OS       : {} {}", os_name, os_ver);
        log::info!("Kernel   : {}", System::kernel_version().unwrap_or_else(|| "Unknown".to_string()));

        // CPU
        if let Some(cpu) = sys.cpus().first() {
            log::info!("CPU      : {}", cpu.brand().trim());
            log::info!("Cores    : {} logical", sys.cpus().len());
        }

        // RAM
        let gib = |bytes: u64| bytes as f32 / 1024.0 / 1024.0 / 1024.0;
        log::info!("Memory   : {:.2} GB used / {:.2} GB total", gib(sys.used_memory()), gib(sys.total_memory()));
    }

    pub fn log_gpu(info: &wgpu::AdapterInfo) {
        log::info!("GPU      : {} ({:?})", info.name, info.device_type);
        log::info!("Backend  : {:?}", info.backend);
        log::info!("Driver   : {} {}", info.driver, info.driver_info);
    }
}
