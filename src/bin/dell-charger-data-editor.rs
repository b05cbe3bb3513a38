#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate dell_charger_data_editor;

use std::io::{
	self,
	Write,
};
use std::process::exit;

use dell_charger_data_editor::hex;
use dell_charger_data_editor::image::{
	self,
	Encoding,
	FieldSpec,
	ImageStore,
};
use dell_charger_data_editor::onewire::{
	list_port_names,
	transport,
	SerialChannel,
};
use dell_charger_data_editor::AResult;

const DEFAULT_IMAGE_FILE: &str = "eeprom-data.hex";

fn prompt(msg: &str) -> AResult<String> {
	print!("{}", msg);
	io::stdout().flush()?;
	let mut line = String::new();
	if 0 == io::stdin().read_line(&mut line)? {
		bail!("end of input");
	}
	Ok(line.trim().to_string())
}

fn field_value(store: &ImageStore, field: &FieldSpec) -> String {
	match field.encoding {
		Encoding::Text => match store.text_field(field) {
			Ok(s) => s,
			Err(e) => {
				warn!("{}", e);
				"?".repeat(field.len)
			},
		},
		Encoding::Decimal => match store.decimal_field(field) {
			Ok(v) => v.to_string(),
			Err(e) => {
				warn!("{}", e);
				"0".to_string()
			},
		},
		Encoding::DecimalTenths => match store.decimal_field(field) {
			Ok(v) => format!("{}.{}", v / 10, v % 10),
			Err(e) => {
				warn!("{}", e);
				"0.0".to_string()
			},
		},
	}
}

fn print_menu(store: &ImageStore) {
	println!(" [0] Manufacturer  : {}", field_value(store, &image::MANUFACTURER));
	println!(" [1] Adapter type  : {}", field_value(store, &image::ADAPTER_TYPE));
	println!(" [2] Watts         : {}", field_value(store, &image::WATTS));
	println!(" [3] Volts         : {}", field_value(store, &image::VOLTS));
	println!(" [4] Amps          : {}", field_value(store, &image::AMPS));
	println!(" [5] Serial number : {}", field_value(store, &image::SERIAL_NUMBER));
	println!(" [6] Save changes and exit");
	println!(" [7] Exit without saving changes");
	println!(" [8] Read EEPROM data via 1wire");
	println!(" [9] Write EEPROM data via 1wire");
}

fn edit_text_field(store: &mut ImageStore, field: &FieldSpec, empty_cancels: bool) -> AResult<()> {
	let value = prompt(&format!("Enter new value ({} chars): ", field.len))?;
	if empty_cancels && value.is_empty() {
		return Ok(());
	}
	if value.len() != field.len {
		println!("Value should be {} chars long!", field.len);
		return Ok(());
	}
	if !value.bytes().all(image::is_text_byte) {
		println!("Invalid value!");
		return Ok(());
	}
	store.set_text_field(field, &value);
	Ok(())
}

fn edit_watts(store: &mut ImageStore) -> AResult<()> {
	let value = match prompt("Enter new value [0-999]: ")?.parse::<u32>() {
		Ok(v) if v <= 999 => v,
		_ => {
			println!("Invalid value!");
			return Ok(());
		},
	};
	store.set_decimal_field(&image::WATTS, value);
	Ok(())
}

fn edit_tenths_field(store: &mut ImageStore, field: &FieldSpec) -> AResult<()> {
	let value = match prompt("Enter new value [0-99.9]: ")?.parse::<f64>() {
		Ok(v) if !v.is_nan() && v >= 0.0 && v <= 99.9 => v,
		_ => {
			println!("Invalid value!");
			return Ok(());
		},
	};
	store.set_decimal_field(field, (value * 10.0) as u32);
	Ok(())
}

fn select_serial_port() -> AResult<Option<SerialChannel>> {
	loop {
		let ports = list_port_names()?;
		println!(" [0] Return to main menu");
		println!(" [1] Enter custom serial port name");
		for (i, name) in ports.iter().enumerate() {
			println!(" [{}] {}", i + 2, name);
		}
		let choice = match prompt(&format!("Select option [0-{}]: ", ports.len() + 1))?
			.parse::<usize>()
		{
			Ok(c) if c <= ports.len() + 1 => c,
			_ => continue,
		};
		let name = match choice {
			0 => return Ok(None),
			1 => prompt("Enter serial port name (e. g. /dev/ttyUSB0, COM1): ")?,
			n => ports[n - 2].clone(),
		};
		match SerialChannel::open(&name) {
			Ok(chan) => return Ok(Some(chan)),
			Err(e) => println!("Error: {}", e),
		}
	}
}

fn read_eeprom(store: &mut ImageStore) -> AResult<()> {
	// the port stays open only for this one transaction
	let mut chan = match select_serial_port()? {
		None => return Ok(()),
		Some(c) => c,
	};
	match transport::read_all(&mut chan, store) {
		Ok(()) => println!("Done"),
		Err(e) => error!("Failed to read EEPROM: {}", e),
	}
	Ok(())
}

fn write_eeprom(store: &ImageStore) -> AResult<()> {
	let mut chan = match select_serial_port()? {
		None => return Ok(()),
		Some(c) => c,
	};
	match transport::write_all(&mut chan, store) {
		Ok(()) => println!("Done"),
		Err(e) => error!("Failed to write EEPROM: {}", e),
	}
	Ok(())
}

fn save_and_exit(store: &mut ImageStore, path: &str) -> AResult<()> {
	if store.recompute_checksum() {
		info!("checksum changed, updating");
	}
	hex::save_image_file(path, store.as_bytes())
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@arg FILE: "Image file to edit (default: eeprom-data.hex)")
	).get_matches();
	let path = matches.value_of("FILE").unwrap_or(DEFAULT_IMAGE_FILE);

	let mut store = match hex::load_image_file(path) {
		Ok(data) => ImageStore::from_bytes(data),
		Err(e) => {
			warn!("{}; starting from the built-in default image", e);
			ImageStore::default()
		},
	};

	loop {
		print_menu(&store);
		let choice = match prompt("Select option [0-9]: ")?.parse::<u32>() {
			Ok(c) => c,
			Err(_) => continue,
		};
		match choice {
			0 => edit_text_field(&mut store, &image::MANUFACTURER, false)?,
			1 => edit_text_field(&mut store, &image::ADAPTER_TYPE, false)?,
			2 => edit_watts(&mut store)?,
			3 => edit_tenths_field(&mut store, &image::VOLTS)?,
			4 => edit_tenths_field(&mut store, &image::AMPS)?,
			5 => edit_text_field(&mut store, &image::SERIAL_NUMBER, true)?,
			6 => {
				save_and_exit(&mut store, path)?;
				break;
			},
			7 => break,
			8 => read_eeprom(&mut store)?,
			9 => write_eeprom(&store)?,
			_ => {},
		}
	}

	Ok(())
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
