use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use bio::io::fastq;
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

#[derive(Debug, PartialEq)]
pub enum DataType {
    Plain,
    Gz,
}

impl DataType {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => DataType::Gz,
            _ => DataType::Plain,
        }
    }
}

/// Opens a plain or gzipped file for reading, chosen by extension.
pub fn open_reader(path: &Path) -> io::Result<Box<dyn Read + Send>> {
    let file = File::open(path)?;
    let stream: Box<dyn Read + Send> = match DataType::from_path(path) {
        DataType::Plain => Box::new(BufReader::new(file)),
        DataType::Gz => Box::new(MultiGzDecoder::new(BufReader::new(file))),
    };
    Ok(stream)
}

/// Plain or gzipped output file. Call [`OutputStream::finish`] to flush and
/// surface write errors instead of losing them on drop.
pub enum OutputStream {
    Plain(BufWriter<File>),
    Gz(GzEncoder<BufWriter<File>>),
}

impl OutputStream {
    /// Creates the output file, gzipped when the extension is `.gz`.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(match DataType::from_path(path) {
            DataType::Plain => OutputStream::Plain(file),
            DataType::Gz => OutputStream::Gz(GzEncoder::new(file, Compression::default())),
        })
    }

    pub fn finish(self) -> io::Result<()> {
        match self {
            OutputStream::Plain(mut w) => w.flush(),
            OutputStream::Gz(w) => w.finish()?.flush(),
        }
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputStream::Plain(w) => w.write(buf),
            OutputStream::Gz(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputStream::Plain(w) => w.flush(),
            OutputStream::Gz(w) => w.flush(),
        }
    }
}

pub fn fastq_reader(path: &Path) -> io::Result<fastq::Reader<BufReader<Box<dyn Read + Send>>>> {
    Ok(fastq::Reader::new(open_reader(path)?))
}

/// Pulls up to `n` records; an empty vector means the input is exhausted.
pub fn next_fastq_chunk<R: io::BufRead>(
    records: &mut fastq::Records<R>,
    n: usize,
) -> io::Result<Vec<fastq::Record>> {
    let mut chunk = Vec::with_capacity(n);
    for record in records.by_ref().take(n) {
        let record = record.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        chunk.push(record);
    }
    Ok(chunk)
}
