use crate::error::*;
use crate::EncoderSettings;
use crate::GIFFrame;
use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;

struct CountingWriter<W> {
    writer: W,
    written: Rc<Cell<u64>>,
}

impl<W: Write> Write for CountingWriter<W> {
    #[inline(always)]
    fn write(&mut self, buf: &[u8]) -> Result<usize, std::io::Error> {
        let len = self.writer.write(buf)?;
        self.written.set(self.written.get() + len as u64);
        Ok(len)
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<(), std::io::Error> {
        self.writer.flush()
    }
}

pub(crate) struct RustEncoder<W: Write> {
    writer: Option<W>,
    written: Rc<Cell<u64>>,
    gif_enc: Option<gif::Encoder<CountingWriter<W>>>,
}

impl<W: Write> RustEncoder<W> {
    pub fn new(writer: W, written: Rc<Cell<u64>>) -> Self {
        Self {
            written,
            writer: Some(writer),
            gif_enc: None,
        }
    }

    #[cfg_attr(debug_assertions, track_caller)]
    pub fn compress_frame(f: GIFFrame) -> GifResult<gif::Frame<'static>> {
        let GIFFrame { pal, image, delay, transparent_index } = f;

        let (buffer, width, height) = image.into_contiguous_buf();

        let mut pal_rgb: Vec<u8> = pal.iter().flat_map(|p| [p.r, p.g, p.b]).collect();
        // Palette should be power-of-two sized
        if pal.len() != 256 {
            let needed_size = 3 * pal.len().max(2).next_power_of_two();
            pal_rgb.resize(needed_size, 0);
        }
        Ok(gif::Frame {
            delay,
            dispose: gif::DisposalMethod::Background,
            transparent: transparent_index,
            needs_user_input: false,
            top: 0,
            left: 0,
            width: u16::try_from(width)?,
            height: u16::try_from(height)?,
            interlaced: false,
            palette: Some(pal_rgb),
            buffer: buffer.into(),
        })
    }

    pub fn write_frame(&mut self, frame: &gif::Frame<'_>, settings: &EncoderSettings) -> GifResult<()> {
        let writer = &mut self.writer;
        let enc = match self.gif_enc {
            None => {
                let w = CountingWriter {
                    writer: writer.take().ok_or(Error::ThreadSend)?,
                    written: self.written.clone(),
                };
                let mut enc = gif::Encoder::new(w, u16::try_from(settings.width)?, u16::try_from(settings.height)?, &[])?;
                enc.set_repeat(settings.repeat)?;
                self.gif_enc.get_or_insert(enc)
            },
            Some(ref mut enc) => enc,
        };

        enc.write_frame(frame)?;
        Ok(())
    }

    /// Writes the trailer and hands the output back
    pub fn finish(self) -> GifResult<W> {
        match self.gif_enc {
            Some(enc) => Ok(enc.into_inner()?.writer),
            None => Err(Error::EmptySequence),
        }
    }
}
