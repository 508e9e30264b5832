use crate::cell::CellValue;
use crate::error::Result;
use crate::sheet::Sheet;
use std::io::Write;

/// CSV reader/writer options
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Whether to use type inference when reading
    pub infer_types: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: b',',
            quote: b'"',
            infer_types: true,
        }
    }
}

impl CsvOptions {
    /// Create options for TSV (tab-separated values)
    #[must_use]
    pub fn tsv() -> Self {
        CsvOptions {
            delimiter: b'\t',
            ..Default::default()
        }
    }

    /// Set the delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Sheet {
    /// Parse a sheet from already-decoded delimited text.
    ///
    /// Ragged records are accepted and padded to the widest row; headers
    /// are not interpreted here (the reader names columns afterwards).
    pub fn from_delimited_str(content: &str, options: &CsvOptions) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut data: Vec<Vec<CellValue>> = Vec::new();

        for result in csv_reader.records() {
            let record = result?;
            let row: Vec<CellValue> = record
                .iter()
                .map(|field| {
                    if options.infer_types {
                        CellValue::parse(field)
                    } else {
                        CellValue::String(field.to_string())
                    }
                })
                .collect();
            data.push(row);
        }

        let mut sheet = Sheet::with_name("Sheet1");
        *sheet.data_mut() = data;
        sheet.make_rectangular();

        Ok(sheet)
    }

    /// Write the sheet (header row included) to a writer as delimited text
    pub fn write_delimited<W: Write>(&self, writer: W, options: &CsvOptions) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .from_writer(writer);

        for row in self.data() {
            let record: Vec<String> = row.iter().map(CellValue::as_str).collect();
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
