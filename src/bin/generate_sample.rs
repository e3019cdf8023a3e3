use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

fn excel_serial(dt: NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid epoch");
    (dt - epoch).num_milliseconds() as f64 / 86_400_000.0
}

const HEADER: [&str; 8] = [
    "Date Created",
    "Vendor Name",
    "Location Name",
    "Created By Username",
    "Product Name",
    "AR Cost",
    "Tracking #",
    "Invoice #",
];

fn main() {
    let mut rng = SimpleRng::new(42);
    let now = Local::now().naive_local();

    let vendors = ["Ceva Logistics", "Ceva Logistics", "Ceva Logistics", "UPS Freight", "DHL"];
    let locations = ["Downtown", "Eastgate Mall", "Airport Kiosk", "Riverside"];
    let users = ["jdoe", "asmith", "mgarcia", "kchen", "tnguyen"];
    let products = [
        "Motorola Edge 2024",
        "Motorola Razr+",
        "Motorola Moto G Stylus",
        "Motorola Moto G Power",
        "Samsung Galaxy A15",
        "Apple iPhone 15",
        "motorola case bundle",
    ];

    let title = Format::new().set_bold().set_font_size(14);
    let header = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name("Report_Output").expect("valid sheet name");
    ws.write_string_with_format(0, 0, "Sales By Product Report", &title)
        .expect("write title");
    for (col, name) in HEADER.iter().enumerate() {
        ws.write_string_with_format(1, col as u16, *name, &header)
            .expect("write header");
    }

    let n_rows = 120u32;
    for i in 0..n_rows {
        let row = i + 2;
        // Spread over the last ten days so some rows fall outside the window.
        let age_minutes = rng.below(10 * 24 * 60) as i64;
        let created = now - Duration::minutes(age_minutes);

        // Every 25th row carries a text date, every 40th an unreadable one.
        if i % 40 == 39 {
            ws.write_string(row, 0, "pending").expect("write date");
        } else if i % 25 == 24 {
            let text = created.format("%m/%d/%Y %H:%M:%S").to_string();
            ws.write_string(row, 0, text).expect("write date");
        } else {
            ws.write_number_with_format(row, 0, excel_serial(created), &date_format)
                .expect("write date");
        }

        ws.write_string(row, 1, rng.pick(&vendors)).expect("write vendor");
        ws.write_string(row, 2, rng.pick(&locations)).expect("write location");
        ws.write_string(row, 3, rng.pick(&users)).expect("write user");
        ws.write_string(row, 4, rng.pick(&products)).expect("write product");

        let cost = if rng.below(10) == 0 {
            0.0
        } else {
            (50 + rng.below(900)) as f64 + 0.99
        };
        ws.write_number(row, 5, cost).expect("write cost");
        ws.write_string(row, 6, format!("1Z{:010}", rng.below(10_000_000_000)))
            .expect("write tracking");
        ws.write_number(row, 7, (100_000 + i) as f64).expect("write invoice");
    }

    let output_path = "Sales_By_Product_Report.xlsx";
    workbook.save(output_path).expect("Failed to write workbook");

    println!("Wrote {n_rows} report rows to {output_path}");
}
