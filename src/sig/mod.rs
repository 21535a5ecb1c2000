/*!
Bit-vector signal expressions

A [`Sig`] is the currency of the process tree: switch selectors, branch
match patterns and both sides of an assignment are all signal expressions.
Each bit is either a constant logic level or a single bit of a host wire;
the vector is stored LSB first.
*/
use crate::{debug_from_display, quick_display};
use itertools::Itertools;
use smallvec::SmallVec;

/// A single logic level
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Bit {
    /// Logic low
    Zero,
    /// Logic high
    One,
    /// Undefined or don't-care
    X,
}

impl Bit {
    /// Whether this bit is a defined logic level, i.e. `0` or `1`
    #[inline]
    pub fn is_def(self) -> bool {
        match self {
            Bit::Zero | Bit::One => true,
            Bit::X => false,
        }
    }
}

quick_display!(Bit, b, fmt => match b {
    Bit::Zero => write!(fmt, "0"),
    Bit::One => write!(fmt, "1"),
    Bit::X => write!(fmt, "x"),
});
debug_from_display!(Bit);

/// A host-assigned wire identifier
///
/// The host owns the wire table; this crate never resolves an identifier,
/// it only compares them.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct WireId(pub u32);

quick_display!(WireId, w, fmt => write!(fmt, "$w{}", w.0));
debug_from_display!(WireId);

/// One bit of a signal expression
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum SigBit {
    /// A constant logic level
    Const(Bit),
    /// A single bit of a host wire, by bit offset
    Wire(WireId, usize),
}

impl SigBit {
    /// Whether this bit is a defined constant
    #[inline]
    pub fn is_def(self) -> bool {
        match self {
            SigBit::Const(b) => b.is_def(),
            SigBit::Wire(..) => false,
        }
    }
}

quick_display!(SigBit, b, fmt => match b {
    SigBit::Const(b) => write!(fmt, "{}", b),
    SigBit::Wire(w, ix) => write!(fmt, "{}[{}]", w, ix),
});
debug_from_display!(SigBit);

/// A signal construction error
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// A constant value does not fit the requested width
    TooManyBits,
    /// A bit range extends past the end of a signal
    OutOfRange,
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Error::TooManyBits => write!(fmt, "constant does not fit the requested width"),
            Error::OutOfRange => write!(fmt, "bit range extends past the end of the signal"),
        }
    }
}

impl std::error::Error for Error {}

/// A bit-vector signal expression, LSB first
#[derive(Clone, Default, Eq, PartialEq, Hash)]
pub struct Sig {
    /// The bits of this signal
    bits: SmallVec<[SigBit; 8]>,
}

impl Sig {
    /// Create the empty signal
    #[inline]
    pub fn new() -> Sig {
        Sig {
            bits: SmallVec::new(),
        }
    }
    /// Create a signal from its bits, LSB first
    pub fn from_bits<I: IntoIterator<Item = SigBit>>(bits: I) -> Sig {
        Sig {
            bits: bits.into_iter().collect(),
        }
    }
    /// Create a constant signal of width `width`. Return an error if high bits are set.
    pub fn from_const(value: u64, width: usize) -> Result<Sig, Error> {
        if width < 64 && value.wrapping_shr(width as u32) != 0 {
            return Err(Error::TooManyBits);
        }
        let bits = (0..width)
            .map(|ix| {
                if ix < 64 && (value >> ix) & 1 == 1 {
                    SigBit::Const(Bit::One)
                } else {
                    SigBit::Const(Bit::Zero)
                }
            })
            .collect();
        Ok(Sig { bits })
    }
    /// Create a signal spanning all `width` bits of a wire
    pub fn wire(id: WireId, width: usize) -> Sig {
        Sig {
            bits: (0..width).map(|ix| SigBit::Wire(id, ix)).collect(),
        }
    }
    /// Create a signal repeating one logic level `width` times
    pub fn repeat(bit: Bit, width: usize) -> Sig {
        Sig {
            bits: (0..width).map(|_| SigBit::Const(bit)).collect(),
        }
    }
    /// Get the width of this signal in bits
    #[inline]
    pub fn width(&self) -> usize {
        self.bits.len()
    }
    /// Whether this signal is the empty bit-vector
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
    /// Get the bits of this signal, LSB first
    #[inline]
    pub fn bits(&self) -> &[SigBit] {
        &self.bits
    }
    /// Whether every bit of this signal is a defined constant
    pub fn is_fully_def(&self) -> bool {
        self.bits.iter().all(|b| b.is_def())
    }
    /// Append another signal's bits above this signal's MSB
    pub fn append(&mut self, other: &Sig) {
        self.bits.extend_from_slice(other.bits());
    }
    /// Extract `len` bits starting at bit `offset`. Return an error if the range does not fit.
    pub fn extract(&self, offset: usize, len: usize) -> Result<Sig, Error> {
        if offset + len > self.bits.len() {
            return Err(Error::OutOfRange);
        }
        Ok(Sig {
            bits: self.bits[offset..offset + len].iter().copied().collect(),
        })
    }
    /// Reset this signal to the empty bit-vector
    #[inline]
    pub fn clear(&mut self) {
        self.bits.clear();
    }
}

impl std::fmt::Display for Sig {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        if self.bits.is_empty() {
            return write!(fmt, "{{}}");
        }
        if self.is_fully_def() {
            write!(fmt, "{}'", self.bits.len())?;
            for bit in self.bits.iter().rev() {
                write!(fmt, "{}", bit)?;
            }
            return Ok(());
        }
        write!(fmt, "{{ {} }}", self.bits.iter().rev().format(", "))
    }
}

debug_from_display!(Sig);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_construction_works() {
        let c = Sig::from_const(0b0101, 4).unwrap();
        assert_eq!(c.width(), 4);
        assert!(c.is_fully_def());
        assert_eq!(c.bits()[0], SigBit::Const(Bit::One));
        assert_eq!(c.bits()[1], SigBit::Const(Bit::Zero));

        // High bits must not be set
        assert!(Sig::from_const(4, 2).is_err());
        // Wide constants zero-extend
        let wide = Sig::from_const(1, 70).unwrap();
        assert_eq!(wide.width(), 70);
        assert!(wide.is_fully_def());

        let w = Sig::wire(WireId(3), 2);
        assert_eq!(w.width(), 2);
        assert!(!w.is_fully_def());

        let x = Sig::repeat(Bit::X, 3);
        assert!(!x.is_fully_def());
        assert!(Sig::new().is_empty());
    }

    #[test]
    fn signal_equality_is_bitwise() {
        let a = Sig::from_const(0b10, 2).unwrap();
        let b = Sig::from_const(0b10, 2).unwrap();
        let c = Sig::from_const(0b10, 3).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c, "Signal equality should take width into account");
        assert_ne!(a, Sig::wire(WireId(0), 2));
    }

    #[test]
    fn extract_and_append_work() {
        let mut low = Sig::from_const(0b01, 2).unwrap();
        let high = Sig::wire(WireId(1), 2);
        low.append(&high);
        assert_eq!(low.width(), 4);
        assert_eq!(low.extract(2, 2).unwrap(), high);
        assert_eq!(low.extract(0, 2).unwrap(), Sig::from_const(0b01, 2).unwrap());
        assert!(low.extract(3, 2).is_err());

        let mut s = Sig::wire(WireId(7), 4);
        s.clear();
        assert!(s.is_empty());
    }

    #[test]
    fn signal_display_works() {
        assert_eq!(Sig::new().to_string(), "{}");
        assert_eq!(Sig::from_const(0b0110, 4).unwrap().to_string(), "4'0110");
        let mut mixed = Sig::from_const(1, 1).unwrap();
        mixed.append(&Sig::wire(WireId(2), 1));
        assert_eq!(mixed.to_string(), "{ $w2[0], 1 }");
    }
}
