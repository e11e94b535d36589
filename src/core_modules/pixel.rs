// THEORY:
// The `Pixel` module is the smallest unit of the compositor. It is a "dumb" data
// container for one straight-alpha RGBA pixel with named channels, so nothing
// downstream ever indexes into a tuple and guesses which slot is alpha.
//
// The only behaviour it carries is the pairwise composite rule: two horizontally
// adjacent source pixels collapse into one. If either side is fully transparent
// the result is transparent black; otherwise the colour channels are averaged
// with floor division and the result is forced fully opaque. There is no gamma
// handling and no premultiplication, partial alpha is treated as opaque.

pub mod pixel {
    use image::Rgba;

    pub type Byte = u8;
    pub type Channel = Byte;
    type WideChannel = u16;

    pub const OPAQUE: Channel = Channel::MAX;

    /// A single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        /// Fully transparent black, the output for any pair touching transparency.
        pub const TRANSPARENT: Pixel = Pixel::new(0, 0, 0, 0);

        pub const fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        pub const fn opaque(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel::new(red, green, blue, OPAQUE)
        }

        pub fn is_transparent(&self) -> bool {
            self.alpha == 0
        }

        /// Blends this pixel with its right-hand neighbour.
        pub fn blend(&self, right: &Pixel) -> Pixel {
            if self.is_transparent() || right.is_transparent() {
                return Pixel::TRANSPARENT;
            }
            Pixel::opaque(
                average(self.red, right.red),
                average(self.green, right.green),
                average(self.blue, right.blue),
            )
        }
    }

    #[inline]
    fn average(a: Channel, b: Channel) -> Channel {
        // u16 sum cannot overflow; the halved value always fits back into a byte.
        ((a as WideChannel + b as WideChannel) / 2) as Channel
    }

    impl From<Rgba<Byte>> for Pixel {
        fn from(Rgba([red, green, blue, alpha]): Rgba<Byte>) -> Self {
            Pixel::new(red, green, blue, alpha)
        }
    }

    impl From<Pixel> for Rgba<Byte> {
        fn from(pixel: Pixel) -> Self {
            Rgba([pixel.red, pixel.green, pixel.blue, pixel.alpha])
        }
    }
}
