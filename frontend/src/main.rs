use phosphor_core::core::machine::Machine;
use phosphor_machines::registry;

mod emulator;
mod input;
mod rom_path;
mod video;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    // Usage: phosphor <rom-path> [--scale N]

    let rom_path = args
        .get(1)
        .expect("Usage: phosphor <rom-path> [--scale N]");
    let scale = parse_scale_arg(&args).unwrap_or(3);

    let entry = registry::find("invaders").expect("invaders machine not registered");
    let rom_set = rom_path::load_rom_set(entry.rom_name, rom_path).expect("Failed to load ROMs");
    let mut machine = (entry.create)(&rom_set).expect("Failed to construct machine");

    let key_map = input::default_key_map(machine.input_map());
    machine.reset();
    emulator::run(machine.as_mut(), &key_map, scale);
}

fn parse_scale_arg(args: &[String]) -> Option<u32> {
    args.windows(2).find_map(|w| {
        if w[0] == "--scale" {
            w[1].parse().ok()
        } else {
            None
        }
    })
}
